//! Template catalogue: list, upload, edit and delete.
use serde_json::Value;

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{NewTemplate, Template, TemplateRef, DEFAULT_TEMPLATE_PROMPT};
use crate::service::IncomingFile;
use crate::supabase::tables::TEMPLATES_BUCKET;
use crate::utils::files::template_object_name;

pub async fn list(state: &AppState, visible_only: bool) -> AppResult<Vec<Template>> {
    let mut templates = state.supabase.list_templates().await?;
    if visible_only {
        templates.retain(Template::visible);
    }
    Ok(templates)
}

/// Store each file in the templates bucket and record a row for it.
/// `prompts` pairs with `files` by index; gaps get the default prompt.
pub async fn upload(state: &AppState, files: Vec<IncomingFile>, prompts: &[String]) -> AppResult<Vec<String>> {
    if files.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }

    let mut uploaded = Vec::with_capacity(files.len());
    for (i, file) in files.into_iter().enumerate() {
        let prompt = prompts
            .get(i)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_TEMPLATE_PROMPT);
        let object_name = template_object_name(&file.file_name);
        let path = format!("templates/{}", object_name);

        state.supabase
            .upload_object(TEMPLATES_BUCKET, &path, file.bytes, &file.content_type, false)
            .await
            .map_err(|e| AppError::Internal(format!("Upload failed: {}", e)))?;

        let url = state.supabase.public_url(TEMPLATES_BUCKET, &path);
        let row = NewTemplate { url: &url, file_name: &object_name, prompt, is_visible: true };
        if let Err(e) = state.supabase.insert_template(&row).await {
            tracing::error!("Failed to record template {}: {}", object_name, e);
        }
        uploaded.push(url);
    }

    tracing::info!("Uploaded {} template(s)", uploaded.len());
    Ok(uploaded)
}

/// Delete templates and their stored images. Storage failures are logged
/// and do not stop the row deletion.
pub async fn bulk_delete(state: &AppState, ids: &[String]) -> AppResult<Vec<TemplateRef>> {
    if ids.is_empty() {
        return Err(AppError::BadRequest("Invalid template IDs provided".to_string()));
    }

    let templates = state.supabase.templates_by_ids(ids).await.map_err(|e| {
        tracing::error!("Error fetching templates for deletion: {}", e);
        AppError::Internal("Failed to fetch templates".to_string())
    })?;
    if templates.is_empty() {
        return Err(AppError::NotFound("No templates found to delete".to_string()));
    }

    let paths: Vec<String> = templates
        .iter()
        .filter_map(|t| t.file_name.as_deref())
        .map(|name| format!("templates/{}", name))
        .collect();
    if !paths.is_empty() {
        if let Err(e) = state.supabase.remove_objects(TEMPLATES_BUCKET, &paths).await {
            tracing::error!("Storage deletion error: {}", e);
        }
    }

    state.supabase.delete_templates(ids).await.map_err(|e| {
        tracing::error!("Database deletion error: {}", e);
        AppError::Internal("Failed to delete templates from database".to_string())
    })?;

    tracing::info!("Deleted {} template(s)", templates.len());
    Ok(templates)
}

pub async fn set_prompt(state: &AppState, id: &str, prompt: &str) -> AppResult<Option<Value>> {
    if id.is_empty() || prompt.is_empty() {
        return Err(AppError::BadRequest("Invalid request data".to_string()));
    }
    let updated = state.supabase.update_template_prompt(id, prompt).await.map_err(|e| {
        tracing::error!("Prompt update error: {}", e);
        AppError::Internal("Failed to update template prompt".to_string())
    })?;
    tracing::info!("Template {} prompt updated", id);
    Ok(updated)
}

pub async fn set_visibility(state: &AppState, id: &str, is_visible: bool) -> AppResult<Option<Value>> {
    if id.is_empty() {
        return Err(AppError::BadRequest("Invalid request data".to_string()));
    }
    let updated = state.supabase.update_template_visibility(id, is_visible).await.map_err(|e| {
        tracing::error!("Visibility update error: {}", e);
        AppError::Internal("Failed to update template visibility".to_string())
    })?;
    tracing::info!("Template {} visibility set to {}", id, is_visible);
    Ok(updated)
}
