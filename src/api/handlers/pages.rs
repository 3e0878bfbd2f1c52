//! Browser pages and the admin password check they use.
use axum::{body::Bytes, extract::State, response::Html, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::handlers::lenient_json_body;
use crate::api::routes::{password_matches, AppState};
use crate::error::{AppError, AppResult};

const INDEX_HTML: &str = include_str!("../../../assets/index.html");
const ADMIN_HTML: &str = include_str!("../../../assets/admin.html");

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn admin_page() -> Html<&'static str> {
    Html(ADMIN_HTML)
}

/// Without a configured password every attempt passes.
pub async fn verify_admin(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let payload = lenient_json_body(&body);
    let supplied = payload.get("password").and_then(|v| v.as_str());
    match &state.admin_password {
        Some(expected) if !password_matches(expected, supplied) => {
            Err(AppError::Unauthorized("Invalid password".to_string()))
        }
        _ => Ok(Json(json!({ "ok": true }))),
    }
}
