//! Catalog queries: list, search and detail
//!
//! List pages put a priority tier first: rated works with at least one image,
//! by title, capped at `priority_pages × page_size` works. Everything else
//! follows by year (newest first, unknown last) then title.

use crate::pagination::{calculate_pagination, Pagination};
use catalog_common::db::TEXT_INDEX_NAME;
use catalog_common::models::{StoredWorkRow, WORK_COLUMNS_T};
use catalog_common::{CatalogStore, Result, Work};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// Page layout of list and search results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    pub page_size: i64,
    /// Pages reserved for the priority tier
    pub priority_pages: i64,
}

impl ListSettings {
    /// Maximum number of works in the priority tier
    pub fn priority_limit(&self) -> i64 {
        self.page_size.max(1) * self.priority_pages.max(0)
    }
}

/// One page of works
#[derive(Debug, Clone, Serialize)]
pub struct BookPage {
    pub works: Vec<Work>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

/// How a search was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Empty query: every work, year then title
    All,
    /// Ranked match against the full-text index
    FullText,
    /// Case-insensitive substring match over title, authors and publisher
    Substring,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub mode: SearchMode,
    #[serde(flatten)]
    pub results: BookPage,
}

/// Outcome of a single-work lookup
#[derive(Debug, Clone)]
pub enum BookLookup {
    Found(Box<Work>),
    /// Identifier is not a UUID
    InvalidId(String),
    NotFound(Uuid),
}

/// Plain year/title ordering, shared by the list tail and the empty search
const YEAR_TITLE_ORDER: &str = "t.year_num DESC, t.title ASC, t.rowid ASC";

/// `search_text` holds the Unicode-lowercased title, authors and publisher
const SUBSTRING_FILTER: &str = "instr(t.search_text, ?1) > 0";

fn decode_rows(rows: Vec<StoredWorkRow>) -> Result<Vec<Work>> {
    rows.into_iter().map(Work::from_stored).collect()
}

/// List page with the priority tier
pub async fn book_list(store: &CatalogStore, page: i64, settings: ListSettings) -> Result<BookPage> {
    let total = store.count_works().await?;
    let pagination = calculate_pagination(total, page, settings.page_size);

    let sql = format!(
        "WITH priority AS (
             SELECT rowid AS rid, ROW_NUMBER() OVER (ORDER BY title ASC, rowid ASC) AS pos
             FROM titles
             WHERE rating IS NOT NULL
               AND (COALESCE(TRIM(image_small), '') <> ''
                    OR COALESCE(TRIM(image_medium), '') <> ''
                    OR COALESCE(TRIM(image_large), '') <> '')
             ORDER BY pos
             LIMIT ?1
         )
         SELECT {cols}
         FROM titles t
         LEFT JOIN priority p ON p.rid = t.rowid
         ORDER BY p.pos IS NULL, p.pos, {order}
         LIMIT ?2 OFFSET ?3",
        cols = WORK_COLUMNS_T,
        order = YEAR_TITLE_ORDER,
    );

    let rows: Vec<StoredWorkRow> = sqlx::query_as(&sql)
        .bind(settings.priority_limit())
        .bind(pagination.page_size)
        .bind(pagination.offset)
        .fetch_all(store.pool())
        .await?;

    Ok(BookPage {
        works: decode_rows(rows)?,
        pagination,
    })
}

/// Search page. Full-text when the index exists and accepts the query,
/// otherwise substring matching.
pub async fn book_search(
    store: &CatalogStore,
    query: &str,
    page: i64,
    settings: ListSettings,
) -> Result<SearchResults> {
    let query = query.trim();

    if query.is_empty() {
        return Ok(SearchResults {
            query: String::new(),
            mode: SearchMode::All,
            results: all_by_year(store, page, settings).await?,
        });
    }

    if let Some(expr) = full_text_expression(query) {
        if store.has_text_index().await? {
            match full_text(store, &expr, page, settings).await {
                Ok(results) => {
                    return Ok(SearchResults {
                        query: query.to_string(),
                        mode: SearchMode::FullText,
                        results,
                    })
                }
                Err(e) => warn!("Full-text search for {:?} failed, using substring match: {}", query, e),
            }
        } else {
            debug!("No {} index, using substring match", TEXT_INDEX_NAME);
        }
    }

    Ok(SearchResults {
        query: query.to_string(),
        mode: SearchMode::Substring,
        results: substring(store, query, page, settings).await?,
    })
}

/// Look up one work by its identifier string
pub async fn book_detail(store: &CatalogStore, raw_id: &str) -> Result<BookLookup> {
    let Ok(id) = Uuid::parse_str(raw_id.trim()) else {
        return Ok(BookLookup::InvalidId(raw_id.to_string()));
    };

    Ok(match store.get_work(&id).await? {
        Some(work) => BookLookup::Found(Box::new(work)),
        None => BookLookup::NotFound(id),
    })
}

/// FTS5 expression matching every whitespace-separated term.
///
/// Terms are quoted so operators and punctuation in user input are taken
/// literally.
pub fn full_text_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

async fn all_by_year(store: &CatalogStore, page: i64, settings: ListSettings) -> Result<BookPage> {
    let total = store.count_works().await?;
    let pagination = calculate_pagination(total, page, settings.page_size);

    let sql = format!(
        "SELECT {} FROM titles t ORDER BY {} LIMIT ?1 OFFSET ?2",
        WORK_COLUMNS_T, YEAR_TITLE_ORDER
    );
    let rows: Vec<StoredWorkRow> = sqlx::query_as(&sql)
        .bind(pagination.page_size)
        .bind(pagination.offset)
        .fetch_all(store.pool())
        .await?;

    Ok(BookPage {
        works: decode_rows(rows)?,
        pagination,
    })
}

async fn full_text(store: &CatalogStore, expr: &str, page: i64, settings: ListSettings) -> Result<BookPage> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM titles_fts WHERE titles_fts MATCH ?1")
        .bind(expr)
        .fetch_one(store.pool())
        .await?;
    let pagination = calculate_pagination(total, page, settings.page_size);

    let sql = format!(
        "SELECT {cols}
         FROM titles_fts
         JOIN titles t ON t.rowid = titles_fts.rowid
         WHERE titles_fts MATCH ?1
         ORDER BY titles_fts.rank, {order}
         LIMIT ?2 OFFSET ?3",
        cols = WORK_COLUMNS_T,
        order = YEAR_TITLE_ORDER,
    );
    let rows: Vec<StoredWorkRow> = sqlx::query_as(&sql)
        .bind(expr)
        .bind(pagination.page_size)
        .bind(pagination.offset)
        .fetch_all(store.pool())
        .await?;

    Ok(BookPage {
        works: decode_rows(rows)?,
        pagination,
    })
}

async fn substring(store: &CatalogStore, query: &str, page: i64, settings: ListSettings) -> Result<BookPage> {
    let needle = query.to_lowercase();

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM titles t WHERE {}",
        SUBSTRING_FILTER
    ))
    .bind(&needle)
    .fetch_one(store.pool())
    .await?;
    let pagination = calculate_pagination(total, page, settings.page_size);

    let sql = format!(
        "SELECT {} FROM titles t WHERE {} ORDER BY {} LIMIT ?2 OFFSET ?3",
        WORK_COLUMNS_T, SUBSTRING_FILTER, YEAR_TITLE_ORDER
    );
    let rows: Vec<StoredWorkRow> = sqlx::query_as(&sql)
        .bind(&needle)
        .bind(pagination.page_size)
        .bind(pagination.offset)
        .fetch_all(store.pool())
        .await?;

    Ok(BookPage {
        works: decode_rows(rows)?,
        pagination,
    })
}
