//! Anthropic Messages API backend

use super::prompt::{render_message, system_prompt};
use super::{AssistantError, AssistantReply, AssistantService};
use crate::session::{ContextTag, Message, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DIRECT_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic service implementation
pub struct AnthropicService {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl AnthropicService {
    pub fn new(
        api_key: String,
        model: String,
        max_tokens: u32,
        gateway: Option<&str>,
    ) -> Result<Self, AssistantError> {
        let base_url = match gateway {
            Some(gw) => format!("{}/_/gateway/anthropic/v1/messages", gw.trim_end_matches('/')),
            None => DIRECT_URL.to_string(),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| AssistantError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            max_tokens,
            base_url,
        })
    }

    fn translate_request(&self, transcript: &[Message], context: ContextTag) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system_prompt(context).to_string(),
            messages: translate_messages(transcript),
        }
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> AssistantError {
        match status.as_u16() {
            401 | 403 => AssistantError::auth(format!("Authentication failed: {body}")),
            429 => AssistantError::rate_limit(format!("Rate limited: {body}")),
            400 => AssistantError::invalid_request(format!("Invalid request: {body}")),
            500..=599 => AssistantError::server_error(format!("Server error: {body}")),
            _ => AssistantError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

/// Convert the transcript into API messages.
///
/// The API expects alternating roles starting with the user. A failed
/// exchange leaves two user messages in a row, so adjacent messages with
/// the same role are merged.
fn translate_messages(transcript: &[Message]) -> Vec<AnthropicMessage> {
    let mut messages: Vec<AnthropicMessage> = Vec::with_capacity(transcript.len());

    for message in transcript {
        let role = match message.role() {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        if messages.is_empty() && role == "assistant" {
            continue;
        }
        let text = render_message(message);
        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&text);
            }
            _ => messages.push(AnthropicMessage {
                role,
                content: text,
            }),
        }
    }

    messages
}

fn normalize_response(resp: AnthropicResponse) -> AssistantReply {
    let content = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");
    AssistantReply::text(content)
}

#[async_trait]
impl AssistantService for AnthropicService {
    async fn respond(
        &self,
        transcript: &[Message],
        context: ContextTag,
    ) -> Result<AssistantReply, AssistantError> {
        let request = self.translate_request(transcript, context);

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AssistantError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    AssistantError::network(format!("Connection failed: {e}"))
                } else {
                    AssistantError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| AssistantError::unknown(format!("Failed to parse response: {e}")))?;

        Ok(normalize_response(parsed))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}
