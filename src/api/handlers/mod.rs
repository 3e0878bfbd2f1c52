//! Axum request handlers for the HTTP API.
use axum::body::Bytes;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

pub mod executions;
pub mod pages;
pub mod results;
pub mod templates;
pub mod uploads;

/// Parse a JSON body, rejecting anything unparsable.
pub(crate) fn json_body(body: &Bytes) -> AppResult<Value> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Rejected request body: {}", e);
        AppError::BadRequest("Invalid request data".to_string())
    })
}

/// Parse a JSON body, treating anything unparsable as `{}`.
pub(crate) fn lenient_json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| json!({}))
}

/// String id from a JSON value; numeric ids are accepted as their text.
pub(crate) fn id_value(v: Option<&Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
