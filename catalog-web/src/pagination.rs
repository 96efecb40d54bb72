//! Pagination utilities for catalog-web

use serde::Serialize;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    pub total_results: i64,
    pub page_size: i64,
    pub has_previous: bool,
    pub has_next: bool,
    /// Offset for SQL LIMIT/OFFSET query
    #[serde(skip)]
    pub offset: i64,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]
///
/// # Examples
/// ```
/// use catalog_web::pagination::calculate_pagination;
///
/// // 45 total results = 3 pages (20 + 20 + 5)
/// let p = calculate_pagination(45, 2, 20);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 20);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(45, 99, 20);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 40);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64, page_size: i64) -> Pagination {
    let page_size = page_size.max(1);
    let total_results = total_results.max(0);
    let total_pages = (total_results + page_size - 1) / page_size;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        total_results,
        page_size,
        has_previous: page > 1,
        has_next: page < total_pages,
        offset,
    }
}

/// Page number from a raw query parameter. Missing or non-numeric means page 1.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}
