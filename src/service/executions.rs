//! Execution lifecycle: create a run, trigger the webhook, record the outcome.
use chrono::Utc;
use serde_json::{json, Value};

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Execution, ExecutionStart, ExecutionStatus};
use crate::webhook::client::{TriggerPayload, WebhookReply};

/// Longest error excerpt stored on a failed execution.
const MAX_ERROR_CHARS: usize = 4000;

/// A validated trigger request.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerInput {
    pub template_urls: Vec<String>,
    pub prompts: Vec<String>,
    pub user_image_url: String,
    pub webhook_url: Option<String>,
    pub execution_id: Option<String>,
}

#[derive(Debug)]
pub struct TriggerOutcome {
    pub execution_id: Option<String>,
    pub reply: WebhookReply,
}

impl TriggerInput {
    /// Validate a raw trigger body.
    ///
    /// `templates` is either a list of URLs or a list of `{url, prompt}`
    /// objects; entries without their own prompt use the top-level `prompt`.
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let templates = body
            .get("templates")
            .and_then(|v| v.as_array())
            .ok_or_else(|| AppError::BadRequest("Templates must be an array".to_string()))?;
        if templates.is_empty() {
            return Err(AppError::BadRequest("No templates provided".to_string()));
        }
        let shared_prompt = non_empty_str(body.get("prompt")).unwrap_or("");

        let mut template_urls = Vec::with_capacity(templates.len());
        let mut prompts = Vec::with_capacity(templates.len());
        for entry in templates {
            match entry {
                Value::String(url) => {
                    template_urls.push(url.clone());
                    prompts.push(shared_prompt.to_string());
                }
                Value::Object(map) => {
                    let url = non_empty_str(map.get("url")).ok_or_else(bad_template_entry)?;
                    template_urls.push(url.to_string());
                    prompts.push(non_empty_str(map.get("prompt")).unwrap_or(shared_prompt).to_string());
                }
                _ => return Err(bad_template_entry()),
            }
        }

        let user_image_url = non_empty_str(body.get("userImageUrl"))
            .ok_or_else(|| AppError::BadRequest("userImageUrl is required".to_string()))?
            .to_string();

        Ok(TriggerInput {
            template_urls,
            prompts,
            user_image_url,
            webhook_url: non_empty_str(body.get("webhookUrl")).map(String::from),
            execution_id: non_empty_str(body.get("execution_id")).map(String::from),
        })
    }
}

fn bad_template_entry() -> AppError {
    AppError::BadRequest("Templates must be URLs or {url, prompt} objects".to_string())
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

pub async fn create(state: &AppState, templates: Value, prompts: Value) -> AppResult<String> {
    let row = ExecutionStart {
        id: None,
        status: ExecutionStatus::Started,
        templates,
        prompts,
        user_image_url: None,
        started_at: None,
    };
    let id = state.supabase.create_execution(&row).await?;
    tracing::info!("Created execution {}", id);
    Ok(id)
}

pub async fn get(state: &AppState, id: &str) -> AppResult<Execution> {
    state.supabase
        .get_execution(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Execution not found".to_string()))
}

/// Run one generation: make sure an execution row exists, call the webhook
/// and record how it went.
pub async fn trigger(state: &AppState, input: TriggerInput) -> AppResult<TriggerOutcome> {
    let webhook_url = input
        .webhook_url
        .clone()
        .or_else(|| state.default_webhook_url.clone())
        .ok_or_else(|| {
            AppError::BadRequest(
                "Missing webhook URL. Set env N8N_WEBHOOK_URL or provide override in request.".to_string(),
            )
        })?;

    let execution_id = start_execution(state, &input).await;

    let payload = TriggerPayload {
        user_image: input.user_image_url,
        templates: input.template_urls,
        prompts: input.prompts,
        execution_id: execution_id.clone(),
    };

    let reply = match state.webhook.trigger(&webhook_url, &payload).await {
        Ok(reply) => reply,
        Err(e) => {
            if let Some(id) = &execution_id {
                let note = truncate_chars(&e.to_string(), MAX_ERROR_CHARS);
                if let Err(err) = state.supabase.finish_execution(id, ExecutionStatus::Error, 0, Some(note)).await {
                    tracing::error!("Failed to update execution row {}: {}", id, err);
                }
            }
            return Err(e);
        }
    };

    if let Some(id) = &execution_id {
        let (status, error) = if reply.ok() {
            (ExecutionStatus::Success, None)
        } else {
            (ExecutionStatus::Error, Some(truncate_chars(&reply.body.to_string(), MAX_ERROR_CHARS)))
        };
        if let Err(e) = state.supabase.finish_execution(id, status, reply.result_count(), error).await {
            tracing::error!("Failed to update execution row {}: {}", id, e);
        }
    }

    Ok(TriggerOutcome { execution_id, reply })
}

/// Upsert the caller's execution row, or insert a fresh one. Store failures
/// are logged; the run proceeds without an id.
async fn start_execution(state: &AppState, input: &TriggerInput) -> Option<String> {
    let mut row = ExecutionStart {
        id: None,
        status: ExecutionStatus::Started,
        templates: json!(input.template_urls),
        prompts: json!(input.prompts),
        user_image_url: Some(input.user_image_url.clone()),
        started_at: None,
    };
    match &input.execution_id {
        Some(id) => {
            row.id = Some(id.clone());
            row.started_at = Some(Utc::now());
            if let Err(e) = state.supabase.upsert_execution(&row).await {
                tracing::error!("Failed to upsert execution row {}: {}", id, e);
            }
            Some(id.clone())
        }
        None => match state.supabase.create_execution(&row).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("Failed to create execution row: {}", e);
                None
            }
        },
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Merge `execution_id` into the webhook reply for the client.
///
/// Objects gain the key; arrays become index-keyed objects so the image
/// references survive; scalars are dropped.
pub fn reply_with_execution_id(body: Value, execution_id: Option<&str>) -> Value {
    let mut merged = match body {
        Value::Object(map) => map,
        Value::Array(arr) => arr
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => serde_json::Map::new(),
    };
    if let Some(id) = execution_id {
        merged.insert("execution_id".to_string(), Value::String(id.to_string()));
    }
    Value::Object(merged)
}
