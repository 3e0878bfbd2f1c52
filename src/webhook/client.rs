//! Outbound call to the image-composition webhook.
//!
//! The webhook is a black box: we post the run bundle as JSON and hand back
//! whatever it answers, parsed as JSON when possible.
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TriggerPayload {
    #[serde(rename = "userImage")]
    pub user_image: String,
    pub templates: Vec<String>,
    pub prompts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebhookReply {
    pub status: StatusCode,
    pub body: Value,
}

impl WebhookReply {
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Number of top-level entries in the reply body.
    pub fn result_count(&self) -> i64 {
        match &self.body {
            Value::Array(arr) => arr.len() as i64,
            Value::Object(map) => map.len() as i64,
            _ => 0,
        }
    }
}

#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(client: Client) -> Self {
        WebhookClient { client }
    }

    /// Post `payload` to `url`. Non-2xx replies are returned, not raised;
    /// only transport failures are errors.
    pub async fn trigger(&self, url: &str, payload: &TriggerPayload) -> AppResult<WebhookReply> {
        tracing::info!("Triggering webhook at URL: {}", url);
        tracing::debug!("Webhook payload: {:?}", payload);

        let response = self.client.post(url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body = parse_reply(&text);
        if status.is_success() {
            tracing::info!("Webhook answered {}", status);
        } else {
            tracing::error!("Webhook returned error. Status: {}, Body: {}", status, text);
        }
        Ok(WebhookReply { status, body })
    }
}

/// Parse the reply text as JSON, wrapping anything else as `{"raw": text}`.
pub fn parse_reply(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_reply_is_wrapped() {
        assert_eq!(parse_reply("Workflow was started"), json!({"raw": "Workflow was started"}));
        assert_eq!(parse_reply(r#"[{"url":"http://x/a.png"}]"#), json!([{"url": "http://x/a.png"}]));
    }

    #[test]
    fn result_count_follows_body_shape() {
        let reply = |body| WebhookReply { status: StatusCode::OK, body };
        assert_eq!(reply(json!([1, 2, 3])).result_count(), 3);
        assert_eq!(reply(json!({"a": 1, "b": 2})).result_count(), 2);
        assert_eq!(reply(json!("text")).result_count(), 0);
        assert_eq!(reply(Value::Null).result_count(), 0);
    }

    #[test]
    fn payload_omits_missing_execution_id() {
        let p = TriggerPayload {
            user_image: "http://img".into(),
            templates: vec!["t".into()],
            prompts: vec!["p".into()],
            execution_id: None,
        };
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({"userImage": "http://img", "templates": ["t"], "prompts": ["p"]})
        );
    }
}
