use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::service::uploads::{upload_product_image, UploadOutcome};
use crate::service::IncomingFile;

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let execution_id = params.get("execution_id").filter(|v| !v.is_empty()).cloned();

    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") && file.is_none() {
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field.content_type().unwrap_or("").to_string();
            let bytes = field.bytes().await?;
            file = Some(IncomingFile { file_name, content_type, bytes });
        } else {
            let _ = field.bytes().await;
        }
    }
    let file = file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let response = match upload_product_image(&state, file, execution_id).await? {
        UploadOutcome::Stored { url, file_size } => Json(json!({
            "url": url,
            "fileSize": file_size,
            "message": "File uploaded successfully to Supabase Storage",
        }))
        .into_response(),
        UploadOutcome::Fallback { url, file_size } => Json(json!({
            "url": url,
            "warning": "Using data URL fallback due to storage issues. This is not recommended for production.",
            "fileSize": file_size,
        }))
        .into_response(),
        UploadOutcome::Rejected { error, sizes: None } => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response()
        }
        UploadOutcome::Rejected { error, sizes: Some((file_size, max_size)) } => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": error, "fileSize": file_size, "maxSize": max_size })),
        )
            .into_response(),
    };
    Ok(response)
}
