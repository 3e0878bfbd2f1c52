use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::handlers::lenient_json_body;
use crate::api::routes::AppState;
use crate::service::results::store_results;

/// Persist generated images found in the body. Nothing to store is a 200;
/// otherwise 201 with whatever made it into the bucket.
pub async fn upload_results(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let payload = lenient_json_body(&body);
    let stored = store_results(&state, &payload).await;
    let status = if stored.candidates == 0 { StatusCode::OK } else { StatusCode::CREATED };
    let count = stored.uploaded.len();
    (status, Json(json!({ "uploaded": stored.uploaded, "count": count })))
}
