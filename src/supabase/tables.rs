//! Typed operations on the AdCraft tables and buckets.
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{
    Execution, ExecutionFinish, ExecutionStart, ExecutionStatus, IdRow, NewTemplate, ResultRecord,
    ResultsMetadataRecord, Template, TemplateRef, UploadRecord,
};
use crate::supabase::client::{eq, in_list, SupabaseClient};

pub const TEMPLATES_BUCKET: &str = "templates";
pub const UPLOADS_BUCKET: &str = "uploads";
pub const RESULTS_BUCKET: &str = "results";

const TEMPLATE_COLUMNS: &str = "id,url,file_name,prompt,created_at,is_visible";

impl SupabaseClient {
    /// All templates, newest first.
    pub async fn list_templates(&self) -> AppResult<Vec<Template>> {
        self.select(
            "templates",
            &[
                ("select", TEMPLATE_COLUMNS.to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    pub async fn insert_template(&self, row: &NewTemplate<'_>) -> AppResult<String> {
        let rows: Vec<IdRow> = self.insert("templates", row, "id").await?;
        first_id(rows, "templates")
    }

    pub async fn templates_by_ids(&self, ids: &[String]) -> AppResult<Vec<TemplateRef>> {
        self.select(
            "templates",
            &[("select", "id,file_name".to_string()), ("id", in_list(ids))],
        )
        .await
    }

    pub async fn delete_templates(&self, ids: &[String]) -> AppResult<()> {
        self.delete("templates", &[("id", in_list(ids))]).await
    }

    pub async fn update_template_prompt(&self, id: &str, prompt: &str) -> AppResult<Option<Value>> {
        let rows: Vec<Value> = self
            .update("templates", &[("id", eq(id))], &json!({ "prompt": prompt }), "id,prompt")
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn update_template_visibility(&self, id: &str, is_visible: bool) -> AppResult<Option<Value>> {
        let rows: Vec<Value> = self
            .update("templates", &[("id", eq(id))], &json!({ "is_visible": is_visible }), "id,is_visible")
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn create_execution(&self, row: &ExecutionStart) -> AppResult<String> {
        let rows: Vec<IdRow> = self.insert("executions", row, "id").await?;
        first_id(rows, "executions")
    }

    pub async fn upsert_execution(&self, row: &ExecutionStart) -> AppResult<()> {
        self.upsert("executions", row, "id").await
    }

    pub async fn finish_execution(&self, id: &str, status: ExecutionStatus, result_count: i64, error: Option<String>) -> AppResult<()> {
        let patch = ExecutionFinish { status, finished_at: Utc::now(), error, result_count };
        let _: Vec<Value> = self.update("executions", &[("id", eq(id))], &patch, "id").await?;
        Ok(())
    }

    pub async fn get_execution(&self, id: &str) -> AppResult<Option<Execution>> {
        let rows: Vec<Execution> = self
            .select("executions", &[("select", "*".to_string()), ("id", eq(id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn record_upload(&self, row: &UploadRecord) -> AppResult<()> {
        self.insert_minimal("uploads", row).await
    }

    pub async fn record_result(&self, row: &ResultRecord<'_>) -> AppResult<()> {
        self.insert_minimal("results", row).await
    }

    pub async fn record_results_metadata(&self, row: &ResultsMetadataRecord<'_>) -> AppResult<()> {
        self.insert_minimal("results_metadata", row).await
    }
}

fn first_id(rows: Vec<IdRow>, table: &str) -> AppResult<String> {
    rows.into_iter()
        .next()
        .map(|r| r.id.to_string())
        .ok_or_else(|| AppError::Internal(format!("Insert into '{}' returned no rows", table)))
}
