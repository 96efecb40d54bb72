//! HTTP error type for catalog-web

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Common(#[from] catalog_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(catalog_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Common(catalog_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log server-side failures; client errors are not logged
    pub fn log(&self) {
        if self.status().is_server_error() {
            error!("Request failed: {}", self);
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}
