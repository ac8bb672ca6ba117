//! Response id normalization.
//!
//! Document stores key records by `_id`; this API exposes `id`. Every JSON
//! response goes through [`normalize_id`] so either kind of record reaches
//! the client in the same shape.

use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Move `_id` to `id` on an object, or on each object in an array.
///
/// Values without `_id` are returned unchanged. Nested objects are left
/// alone.
pub fn normalize_id(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_object).collect()),
        other => normalize_object(other),
    }
}

fn normalize_object(value: Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };
    if let Some(id) = map.remove("_id") {
        map.insert("id".to_owned(), id);
    }
    Value::Object(map)
}

/// JSON response whose body has been passed through [`normalize_id`].
#[derive(Debug)]
pub struct ApiJson<T> {
    body: T,
    failure: &'static str,
}

impl<T> ApiJson<T> {
    /// Wrap `body`. `failure` is the message sent if serialization fails.
    pub fn new(body: T, failure: &'static str) -> Self {
        Self { body, failure }
    }
}

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self.body) {
            Ok(value) => axum::Json(normalize_id(value)).into_response(),
            Err(e) => ApiError::Internal {
                message: self.failure,
                cause: e.to_string(),
            }
            .into_response(),
        }
    }
}
