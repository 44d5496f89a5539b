use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced through the HTTP API.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request was structurally or semantically invalid.
    #[error("{0}")]
    BadRequest(String),

    /// A path parameter named a resource that does not exist.
    #[error("{0}")]
    NotFound(String),

    /// One or more rules in the request failed validation.
    #[error("rule validation failed")]
    Validation(Vec<String>),
}

impl ServerError {
    /// Shorthand for a `400` with a formatted message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": message }),
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": message }),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "rule validation failed", "errors": errors }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}
