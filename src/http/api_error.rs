// Mapping from failures to HTTP responses.
//
// Game outcomes never come through here; they are plain 200 replies.

use crate::core::brainrot::BrainrotError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing. Answered as plain text.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] BrainrotError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal(err) => {
                tracing::error!("Brainrot request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Error en el servidor",
                        "error": err.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}
