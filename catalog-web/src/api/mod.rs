//! HTTP handlers for catalog-web

pub mod books;
pub mod health;
pub mod pages;

pub use books::{get_book, list_books, search_books};
pub use health::health_routes;
pub use pages::{book_page, index_page, search_page};

use serde::Deserialize;

/// Query parameters shared by list and search routes.
///
/// `page` is kept as text so a non-numeric value falls back to page 1
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl CatalogQuery {
    pub fn page(&self) -> i64 {
        crate::pagination::parse_page(self.page.as_deref())
    }

    pub fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }
}
