//! JSON catalog API
//!
//! - GET /api/books?page=N
//! - GET /api/search?q=...&page=N
//! - GET /api/books/:id

use axum::{
    extract::{Path, Query, State},
    Json,
};
use catalog_common::Work;

use super::CatalogQuery;
use crate::books::{self, BookLookup, BookPage, SearchResults};
use crate::error::ApiError;
use crate::AppState;

/// GET /api/books
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<BookPage>, ApiError> {
    let page = books::book_list(&state.store, query.page(), state.settings).await?;
    Ok(Json(page))
}

/// GET /api/search
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let results =
        books::book_search(&state.store, query.query(), query.page(), state.settings).await?;
    Ok(Json(results))
}

/// GET /api/books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Work>, ApiError> {
    let work = found(books::book_detail(&state.store, &id).await?)?;
    Ok(Json(*work))
}

/// The work of a successful lookup, or the matching client error
pub(crate) fn found(lookup: BookLookup) -> Result<Box<Work>, ApiError> {
    match lookup {
        BookLookup::Found(work) => Ok(work),
        BookLookup::InvalidId(raw) => Err(ApiError::BadRequest(format!("Invalid book id: {}", raw))),
        BookLookup::NotFound(id) => Err(ApiError::NotFound(format!("Book not found: {}", id))),
    }
}
