//! Error types for the canvas HTTP API.
//!
//! [`ApiError`] converts into an Axum response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The
//! underlying cause is logged; the client only sees a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use canvas_db::DbError;

/// Client-visible body for a failed history read.
pub const FETCH_SHAPES_FAILED: &str = "Failed to fetch shapes";

/// Errors that can occur in the HTTP API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The shape history could not be read from the store.
    #[error("failed to fetch shapes: {0}")]
    FetchShapes(#[source] DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::FetchShapes(_) => (StatusCode::INTERNAL_SERVER_ERROR, FETCH_SHAPES_FAILED),
        };

        tracing::error!(error = %self, status = status.as_u16(), "Request failed");

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
