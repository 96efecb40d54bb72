//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response: status, module name, version and catalog size
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Works in the catalog; absent when the database cannot be read
    pub works: Option<i64>,
}

/// GET /health
///
/// Reports "degraded" rather than failing when the catalog cannot be counted.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let works = match state.store.count_works().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Health check could not count works: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: if works.is_some() { "ok" } else { "degraded" }.to_string(),
        module: "catalog-web".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        works,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
