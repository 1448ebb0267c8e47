//! HTTP request handlers.

pub mod blog;
pub mod docs;
pub mod navigation;

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// Standard error payload for JSON endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build a JSON 404 response with the given message.
pub(crate) fn not_found(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
