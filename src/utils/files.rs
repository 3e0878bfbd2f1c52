//! Object naming and data URL helpers.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const RECOMMENDED_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Replace anything outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    if safe.is_empty() { "upload.png".to_string() } else { safe }
}

/// Text after the last dot, or the whole name when there is none.
fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// `templates/<uuid>.<ext>` style object name for a template file.
pub fn template_object_name(original: &str) -> String {
    let ext: String = last_segment(original)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let ext = if ext.is_empty() { "png".to_string() } else { ext };
    format!("{}.{}", Uuid::new_v4(), ext)
}

/// `uploads/<epoch ms>-<uuid>.<ext>` path for a product photo.
pub fn upload_object_path(original: &str) -> String {
    let safe = sanitize_file_name(original);
    let ext = match last_segment(&safe) {
        "" => "png",
        e => e,
    };
    format!("uploads/{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), ext)
}

/// `result-<epoch ms>-<index>.<ext>` name for a generated image.
pub fn result_file_name(index: usize, content_type: &str) -> String {
    format!(
        "result-{}-{}.{}",
        Utc::now().timestamp_millis(),
        index,
        extension_for_mime(content_type)
    )
}

/// Subtype of a mime type without parameters, `png` when absent.
pub fn extension_for_mime(mime: &str) -> String {
    let subtype = mime.split('/').nth(1).unwrap_or("");
    let ext = subtype.split(';').next().unwrap_or("").trim();
    if ext.is_empty() { "png".to_string() } else { ext.to_string() }
}

/// Decode `data:<mime>;base64,<payload>` into its mime type and bytes.
pub fn parse_data_url(url: &str) -> AppResult<(String, Vec<u8>)> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| AppError::BadRequest("Malformed data URL".to_string()))?;
    let mime = header
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .filter(|m| !m.is_empty())
        .unwrap_or("image/png")
        .to_string();
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((mime, bytes))
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Size in MiB with one decimal, as shown to users.
pub fn megabytes(size: u64) -> String {
    format!("{:.1}", size as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_unsafe_characters() {
        assert_eq!(sanitize_file_name("my photo (1).JPG"), "my_photo__1_.JPG");
        assert_eq!(sanitize_file_name(""), "upload.png");
    }

    #[test]
    fn template_names_keep_extension() {
        let name = template_object_name("banner.final.webp");
        assert!(name.ends_with(".webp"));
        assert_eq!(name.len(), 36 + ".webp".len());
        assert!(template_object_name("noext").ends_with(".noext"));
        assert!(template_object_name("odd.$$").ends_with(".png"));
    }

    #[test]
    fn upload_paths_live_under_uploads() {
        let path = upload_object_path("shoe.jpeg");
        assert!(path.starts_with("uploads/"));
        assert!(path.ends_with(".jpeg"));
        assert!(upload_object_path("trailing.").ends_with(".png"));
    }

    #[test]
    fn mime_extensions() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpeg");
        assert_eq!(extension_for_mime("image/webp; charset=binary"), "webp");
        assert_eq!(extension_for_mime("garbage"), "png");
    }

    #[test]
    fn data_urls_decode() {
        let url = to_data_url("image/gif", b"GIF89a");
        let (mime, bytes) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/gif");
        assert_eq!(bytes, b"GIF89a");
        assert!(parse_data_url("data:image/png;base64").is_err());
        assert!(parse_data_url("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn megabytes_rounds_to_one_decimal() {
        assert_eq!(megabytes(MAX_FILE_SIZE), "50.0");
        assert_eq!(megabytes(1572864), "1.5");
    }
}
