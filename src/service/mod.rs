//! Operations shared by the HTTP handlers and `adcraftctl`.
//!
//! Each function takes the shared [`AppState`](crate::api::routes::AppState)
//! and returns domain values; turning them into response bodies is left to
//! the caller.
use axum::body::Bytes;

pub mod executions;
pub mod results;
pub mod templates;
pub mod uploads;

/// A file received from a form or read from disk.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl IncomingFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
