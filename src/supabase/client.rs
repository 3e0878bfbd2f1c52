//! Thin HTTP client for the Supabase REST and storage endpoints.
//!
//! - Table operations go through PostgREST at `/rest/v1/<table>`.
//! - Object uploads and removals go through `/storage/v1/object/<bucket>`.
//! - Public object URLs are built locally, no request is made.
use axum::body::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use crate::error::{AppResult, AppError};

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// PostgREST `eq` filter value.
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// PostgREST `in` filter value with each id quoted.
pub fn in_list(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "")))
        .collect();
    format!("in.({})", quoted.join(","))
}

impl SupabaseClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        SupabaseClient { client: Client::new(), base_url: base, api_key }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Select rows from `table`. `query` holds PostgREST parameters such as
    /// `select`, `order` and column filters.
    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> AppResult<Vec<T>> {
        let response = self.authed(self.client.get(self.rest_url(table)))
            .query(query)
            .send()
            .await?;
        let response = check_store(response, table).await?;
        Ok(response.json().await?)
    }

    /// Insert `rows` and return the representation PostgREST echoes back,
    /// narrowed to the `select` columns.
    pub async fn insert<B, T>(&self, table: &str, rows: &B, select: &str) -> AppResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.authed(self.client.post(self.rest_url(table)))
            .query(&[("select", select)])
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        let response = check_store(response, table).await?;
        Ok(response.json().await?)
    }

    /// Insert `rows` without reading anything back.
    pub async fn insert_minimal<B: Serialize + ?Sized>(&self, table: &str, rows: &B) -> AppResult<()> {
        let response = self.authed(self.client.post(self.rest_url(table)))
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;
        check_store(response, table).await?;
        Ok(())
    }

    /// Insert or merge `row` on the `on_conflict` column.
    pub async fn upsert<B: Serialize + ?Sized>(&self, table: &str, row: &B, on_conflict: &str) -> AppResult<()> {
        let response = self.authed(self.client.post(self.rest_url(table)))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row)
            .send()
            .await?;
        check_store(response, table).await?;
        Ok(())
    }

    /// Patch the rows matched by `filter` and return the updated rows.
    pub async fn update<B, T>(&self, table: &str, filter: &[(&str, String)], patch: &B, select: &str) -> AppResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.authed(self.client.patch(self.rest_url(table)))
            .query(filter)
            .query(&[("select", select)])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        let response = check_store(response, table).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, table: &str, filter: &[(&str, String)]) -> AppResult<()> {
        if filter.is_empty() {
            // PostgREST would otherwise delete the whole table
            return Err(AppError::Internal(format!("Refusing unfiltered delete on '{}'", table)));
        }
        let response = self.authed(self.client.delete(self.rest_url(table)))
            .query(filter)
            .send()
            .await?;
        check_store(response, table).await?;
        Ok(())
    }

    /// Upload bytes to `bucket` at `path`.
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> AppResult<()> {
        let url = self.object_url(bucket, path);
        tracing::debug!("Uploading {} bytes to {}", bytes.len(), url);
        let response = self.authed(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        check_storage(response).await
    }

    /// Remove objects from `bucket`.
    pub async fn remove_objects(&self, bucket: &str, paths: &[String]) -> AppResult<()> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, bucket);
        let response = self.authed(self.client.delete(&url))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        check_storage(response).await
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}

async fn check_store(response: Response, table: &str) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
    let message = upstream_message(&body);
    tracing::error!("Store request on '{}' failed. Status: {}, Body: {}", table, status, body);
    Err(AppError::Store { status: status.as_u16(), message })
}

async fn check_storage(response: Response) -> AppResult<()> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
    tracing::error!("Storage request failed. Status: {}, Body: {}", status, body);
    Err(AppError::Storage(upstream_message(&body)))
}

/// Pull the human-readable message out of a PostgREST or storage error body.
fn upstream_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => v
            .get("message")
            .or_else(|| v.get("error"))
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_render_postgrest_syntax() {
        assert_eq!(eq("abc"), "eq.abc");
        assert_eq!(in_list(&["a".into(), "b".into()]), "in.(\"a\",\"b\")");
    }

    #[test]
    fn public_url_uses_public_prefix() {
        let c = SupabaseClient::new("https://proj.supabase.co/".into(), "k".into());
        assert_eq!(
            c.public_url("templates", "templates/x.png"),
            "https://proj.supabase.co/storage/v1/object/public/templates/templates/x.png"
        );
    }

    #[test]
    fn upstream_message_prefers_message_field() {
        assert_eq!(upstream_message(r#"{"message":"The object exceeded the maximum allowed size"}"#),
            "The object exceeded the maximum allowed size");
        assert_eq!(upstream_message(r#"{"error":"Bucket not found"}"#), "Bucket not found");
        assert_eq!(upstream_message("boom"), "boom");
    }
}
