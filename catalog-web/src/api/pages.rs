//! HTML pages
//!
//! Failures render an in-page message with the matching status code.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};

use super::books::found;
use super::CatalogQuery;
use crate::books;
use crate::error::ApiError;
use crate::{render, AppState};

fn error_response(err: ApiError) -> Response {
    err.log();
    (err.status(), Html(render::error_page(&err.to_string()))).into_response()
}

/// GET /
pub async fn index_page(State(state): State<AppState>, Query(query): Query<CatalogQuery>) -> Response {
    match books::book_list(&state.store, query.page(), state.settings).await {
        Ok(page) => Html(render::list_page(&page)).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// GET /search/
pub async fn search_page(State(state): State<AppState>, Query(query): Query<CatalogQuery>) -> Response {
    match books::book_search(&state.store, query.query(), query.page(), state.settings).await {
        Ok(results) => Html(render::search_page(&results)).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// GET /book/:id/
pub async fn book_page(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let lookup = books::book_detail(&state.store, &id)
        .await
        .map_err(ApiError::from)
        .and_then(found);

    match lookup {
        Ok(work) => Html(render::detail_page(&work)).into_response(),
        Err(e) => error_response(e),
    }
}
