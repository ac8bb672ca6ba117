//! HTTP error types.
//!
//! Every failure reaches the client as `{"message": "..."}` with a fixed,
//! per-route message. Storage causes are logged and never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use nxdocs_storage::StorageError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Requested resource not found.
    NotFound(&'static str),
    /// Storage or request handling failed. `cause` is only logged.
    Internal {
        message: &'static str,
        cause: String,
    },
}

impl ApiError {
    /// Adapter for `map_err` that hides a storage failure behind `message`.
    pub fn internal(message: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |err| Self::Internal {
            message,
            cause: err.to_string(),
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Internal { message, cause } => {
                tracing::error!(error = %cause, "{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, axum::Json(ErrorBody { message })).into_response()
    }
}
