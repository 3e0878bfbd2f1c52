use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::handlers::lenient_json_body;
use crate::api::routes::AppState;
use crate::error::AppResult;
use crate::service::executions::{self, reply_with_execution_id, TriggerInput};

pub async fn create_execution(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let payload = lenient_json_body(&body);
    let templates = payload.get("templates").cloned().unwrap_or(Value::Null);
    let prompts = payload.get("prompts").cloned().unwrap_or(Value::Null);

    let id = executions::create(&state, templates, prompts).await?;
    Ok((StatusCode::CREATED, Json(json!({ "execution_id": id }))))
}

pub async fn get_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let execution = executions::get(&state, &id).await?;
    Ok(Json(json!({ "execution": execution })))
}

/// Forward a run to the webhook. A failing webhook answers 502 with its
/// reply attached.
pub async fn trigger(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Response> {
    let payload = lenient_json_body(&body);
    let input = TriggerInput::from_json(&payload)?;
    let outcome = executions::trigger(&state, input).await?;

    if !outcome.reply.ok() {
        let body = json!({
            "error": "n8n webhook returned error",
            "status": outcome.reply.status.as_u16(),
            "response": outcome.reply.body,
            "execution_id": outcome.execution_id,
        });
        return Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response());
    }

    let merged = reply_with_execution_id(outcome.reply.body, outcome.execution_id.as_deref());
    Ok(Json(merged).into_response())
}
