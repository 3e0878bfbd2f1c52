use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::handlers::{id_value, json_body};
use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::service::{templates, IncomingFile};

/// Store failures degrade to an empty catalogue so the wizard still renders.
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let visible_only = params.get("visible").map(|v| v == "true" || v == "1").unwrap_or(false);
    match templates::list(&state, visible_only).await {
        Ok(list) => {
            tracing::debug!("Templates found: {}", list.len());
            Json(json!({ "templates": list }))
        }
        Err(e) => {
            tracing::error!("Template list error: {}", e);
            Json(json!({ "templates": [] }))
        }
    }
}

pub async fn upload_templates(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Value>)> {
    let mut files = Vec::new();
    let mut prompts = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("files") => {
                let file_name = field.file_name().unwrap_or("template.png").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field.bytes().await?;
                files.push(IncomingFile { file_name, content_type, bytes });
            }
            Some("prompts") => prompts.push(field.text().await?),
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    let uploaded = templates::upload(&state, files, &prompts).await?;
    Ok((StatusCode::CREATED, Json(json!({ "uploaded": uploaded }))))
}

pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let payload = json_body(&body)?;
    let ids: Vec<String> = payload
        .get("templateIds")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| id_value(Some(v))).collect())
        .unwrap_or_default();
    if ids.is_empty() {
        return Err(AppError::BadRequest("Invalid template IDs provided".to_string()));
    }

    let deleted = templates::bulk_delete(&state, &ids).await?;
    Ok(Json(json!({
        "success": true,
        "deletedCount": deleted.len(),
        "deletedTemplates": deleted,
    })))
}

pub async fn update_prompt(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let payload = json_body(&body)?;
    let id = id_value(payload.get("templateId"));
    let prompt = payload.get("prompt").and_then(|v| v.as_str()).filter(|p| !p.is_empty());
    let (Some(id), Some(prompt)) = (id, prompt) else {
        return Err(AppError::BadRequest("Invalid request data".to_string()));
    };

    let template = templates::set_prompt(&state, &id, prompt).await?;
    Ok(Json(json!({ "success": true, "template": template })))
}

pub async fn update_visibility(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let payload = json_body(&body)?;
    let id = id_value(payload.get("templateId"));
    let is_visible = payload.get("isVisible").and_then(|v| v.as_bool());
    let (Some(id), Some(is_visible)) = (id, is_visible) else {
        return Err(AppError::BadRequest("Invalid request data".to_string()));
    };

    let template = templates::set_visibility(&state, &id, is_visible).await?;
    Ok(Json(json!({ "success": true, "template": template })))
}
