//! Row shapes for the backend tables.
//!
//! Field names match the column names, so these serialize straight into
//! PostgREST request bodies and deserialize from its responses.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_TEMPLATE_PROMPT: &str = "Place the uploaded product onto this template image as a realistic ad composite. Keep aspect ratio and add soft shadow.";

/// Primary key as the store returns it: uuid columns come back as text,
/// identity columns as numbers. Serializes back in the same shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RowId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Number(n) => write!(f, "{}", n),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

/// A catalogue row. Text columns are nullable in the table and pass
/// through as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: RowId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_visible: Option<bool>,
}

impl Template {
    /// Rows written before the visibility column existed carry no value.
    pub fn visible(&self) -> bool {
        self.is_visible != Some(false)
    }
}

#[derive(Debug, Serialize)]
pub struct NewTemplate<'a> {
    pub url: &'a str,
    pub file_name: &'a str,
    pub prompt: &'a str,
    pub is_visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRef {
    pub id: RowId,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Started,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: RowId,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub templates: Option<Value>,
    #[serde(default)]
    pub prompts: Option<Value>,
    #[serde(default)]
    pub user_image_url: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub result_count: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Insert or upsert body for the `executions` table.
#[derive(Debug, Serialize)]
pub struct ExecutionStart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: ExecutionStatus,
    pub templates: Value,
    pub prompts: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ExecutionFinish {
    pub status: ExecutionStatus,
    pub finished_at: DateTime<Utc>,
    pub error: Option<String>,
    pub result_count: i64,
}

#[derive(Debug, Serialize)]
pub struct UploadRecord {
    pub url: String,
    pub file_name: String,
    pub execution_id: Option<String>,
    pub file_size: u64,
    pub content_type: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct ResultRecord<'a> {
    pub execution_id: Option<&'a str>,
    pub url: &'a str,
    pub file_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResultsMetadataRecord<'a> {
    pub result_urls: &'a [String],
    pub metadata: &'a Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct IdRow {
    pub id: RowId,
}
