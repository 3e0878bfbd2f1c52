//! Copy generated images into the results bucket.
use axum::body::Bytes;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;

use crate::api::routes::AppState;
use crate::error::AppResult;
use crate::models::{ResultRecord, ResultsMetadataRecord};
use crate::supabase::tables::RESULTS_BUCKET;
use crate::utils::files::{parse_data_url, result_file_name};
use crate::utils::image_urls::{collect_image_strings, filter_generated};

#[derive(Debug, Default)]
pub struct StoredResults {
    /// Image references that survived filtering.
    pub candidates: usize,
    pub uploaded: Vec<String>,
}

/// Find generated images in `body` and persist them.
///
/// `body` is `{results?, metadata?}` or any JSON holding image references.
/// Every per-image failure is logged and skipped.
pub async fn store_results(state: &AppState, body: &Value) -> StoredResults {
    let candidate = match body.get("results") {
        Some(results) if results.is_array() => results,
        _ => body,
    };
    let metadata = body.get("metadata").filter(|m| !m.is_null());

    let mut exclusions: HashSet<String> = HashSet::new();
    if let Some(meta) = metadata {
        if let Some(templates) = meta.get("templates").and_then(|v| v.as_array()) {
            exclusions.extend(templates.iter().filter_map(|t| t.as_str().map(String::from)));
        }
        if let Some(user_image) = meta.get("userImageUrl").and_then(|v| v.as_str()) {
            exclusions.insert(user_image.to_string());
        }
    }
    let execution_id = metadata
        .and_then(|m| m.get("execution_id"))
        .and_then(|v| v.as_str());

    let images = filter_generated(collect_image_strings(candidate), &exclusions);
    let mut stored = StoredResults { candidates: images.len(), uploaded: Vec::new() };

    for (i, image) in images.iter().enumerate() {
        let (content_type, bytes) = match load_image(state, image).await {
            Ok(Some(loaded)) => loaded,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!("Failed to load result image {}: {}", i, e);
                continue;
            }
        };

        let file_name = result_file_name(i, &content_type);
        let path = format!("generated/{}", file_name);
        if let Err(e) = state.supabase.upload_object(RESULTS_BUCKET, &path, bytes, &content_type, false).await {
            tracing::error!("Result upload error: {}", e);
            continue;
        }

        let url = state.supabase.public_url(RESULTS_BUCKET, &path);
        let row = ResultRecord { execution_id, url: &url, file_name: &file_name };
        if let Err(e) = state.supabase.record_result(&row).await {
            tracing::error!("Failed to record result {}: {}", file_name, e);
        }
        stored.uploaded.push(url);
    }

    if let Some(meta) = metadata {
        if !stored.uploaded.is_empty() {
            let row = ResultsMetadataRecord {
                result_urls: &stored.uploaded,
                metadata: meta,
                created_at: Utc::now(),
            };
            if let Err(e) = state.supabase.record_results_metadata(&row).await {
                tracing::error!("Metadata storage error: {}", e);
            }
        }
    }

    tracing::info!("Stored {} of {} result image(s)", stored.uploaded.len(), stored.candidates);
    stored
}

/// Bytes and content type for an image reference. `Ok(None)` means the
/// remote answered with a non-success status.
async fn load_image(state: &AppState, image: &str) -> AppResult<Option<(String, Bytes)>> {
    if image.starts_with("data:") {
        return parse_data_url(image).map(|(mime, bytes)| Some((mime, Bytes::from(bytes))));
    }
    let response = state.http.get(image).send().await?;
    if !response.status().is_success() {
        tracing::warn!("Skipping result {}: status {}", image, response.status());
        return Ok(None);
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("image/png")
        .to_string();
    let bytes = response.bytes().await?;
    Ok(Some((content_type, bytes)))
}
