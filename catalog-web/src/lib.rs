//! catalog-web library - read-only book catalog browser
//!
//! HTML pages and a JSON API over the catalog store: a priority-ordered list,
//! search (full-text with substring fallback) and per-book detail.

use axum::Router;
use catalog_common::config::CatalogConfig;
use catalog_common::CatalogStore;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod books;
pub mod error;
pub mod pagination;
pub mod render;

pub use books::ListSettings;
pub use error::ApiError;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
    pub settings: ListSettings,
}

impl AppState {
    pub fn new(store: CatalogStore, settings: ListSettings) -> Self {
        Self { store, settings }
    }

    /// State with page layout taken from resolved configuration
    pub fn from_config(store: CatalogStore, config: &CatalogConfig) -> Self {
        Self::new(
            store,
            ListSettings {
                page_size: config.page_size,
                priority_pages: config.priority_pages,
            },
        )
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let pages = Router::new()
        .route("/", get(api::index_page))
        .route("/search/", get(api::search_page))
        .route("/book/:id/", get(api::book_page));

    let json = Router::new()
        .route("/api/books", get(api::list_books))
        .route("/api/search", get(api::search_books))
        .route("/api/books/:id", get(api::get_book));

    Router::new()
        .merge(pages)
        .merge(json)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
