//! Product photo upload with a data URL fallback for small files.
use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::models::UploadRecord;
use crate::service::IncomingFile;
use crate::supabase::tables::UPLOADS_BUCKET;
use crate::utils::files::{megabytes, to_data_url, upload_object_path, MAX_FILE_SIZE, RECOMMENDED_FILE_SIZE};

#[derive(Debug, PartialEq)]
pub enum UploadOutcome {
    Stored { url: String, file_size: u64 },
    /// Storage was unavailable; the image travels inline as a data URL.
    Fallback { url: String, file_size: u64 },
    Rejected { error: String, sizes: Option<(u64, u64)> },
}

pub async fn upload_product_image(state: &AppState, file: IncomingFile, execution_id: Option<String>) -> AppResult<UploadOutcome> {
    let file_size = file.size();
    if file_size > MAX_FILE_SIZE {
        return Ok(UploadOutcome::Rejected {
            error: format!(
                "File too large. Maximum size is {}MB. Your file is {}MB.",
                MAX_FILE_SIZE / (1024 * 1024),
                megabytes(file_size)
            ),
            sizes: None,
        });
    }

    let path = upload_object_path(&file.file_name);
    let stored = state.supabase
        .upload_object(UPLOADS_BUCKET, &path, file.bytes.clone(), &file.content_type, false)
        .await;

    match stored {
        Ok(()) => {
            let url = state.supabase.public_url(UPLOADS_BUCKET, &path);
            let file_name = path.rsplit('/').next().unwrap_or(&path).to_string();
            record(state, UploadRecord {
                url: url.clone(),
                file_name,
                execution_id,
                file_size,
                content_type: file.content_type,
                is_fallback: false,
            })
            .await;
            Ok(UploadOutcome::Stored { url, file_size })
        }
        Err(AppError::Storage(message)) if message.contains("size") || message.contains("exceeded") => {
            Ok(UploadOutcome::Rejected {
                error: format!(
                    "File too large for storage. Please use a smaller image (under {}MB). Current size: {}MB.",
                    RECOMMENDED_FILE_SIZE / (1024 * 1024),
                    megabytes(file_size)
                ),
                sizes: Some((file_size, RECOMMENDED_FILE_SIZE)),
            })
        }
        Err(e) => {
            tracing::error!("Storage upload error: {}", e);
            if file_size > RECOMMENDED_FILE_SIZE {
                return Ok(UploadOutcome::Rejected {
                    error: format!(
                        "Upload failed. File is too large ({}MB). Please use a smaller image or contact support.",
                        megabytes(file_size)
                    ),
                    sizes: Some((file_size, RECOMMENDED_FILE_SIZE)),
                });
            }
            let mime = if file.content_type.is_empty() { "image/png" } else { file.content_type.as_str() };
            let url = to_data_url(mime, &file.bytes);
            let file_name = if file.file_name.is_empty() { "fallback.png".to_string() } else { file.file_name.clone() };
            record(state, UploadRecord {
                url: url.clone(),
                file_name,
                execution_id,
                file_size,
                content_type: file.content_type.clone(),
                is_fallback: true,
            })
            .await;
            tracing::warn!("Serving upload as data URL fallback ({} bytes)", file_size);
            Ok(UploadOutcome::Fallback { url, file_size })
        }
    }
}

async fn record(state: &AppState, row: UploadRecord) {
    if let Err(e) = state.supabase.record_upload(&row).await {
        tracing::error!("Failed to record upload {}: {}", row.file_name, e);
    }
}
