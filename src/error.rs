//! Caller-facing request errors
//!
//! Only input validation failures become HTTP errors. Anything that goes
//! wrong after validation is reported inside the `ExecutionResult`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("Source code is required")]
    MissingSource,

    #[error("Source code is too large (max {}KB)", .max_bytes / 1000)]
    SourceTooLarge { max_bytes: usize },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid request body")]
    InvalidBody(String),
}

/// `{ "error": ..., "details"?: ... }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RequestError {
    fn details(&self) -> Option<String> {
        match self {
            RequestError::InvalidBody(details) => Some(details.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
