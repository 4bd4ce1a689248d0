//! Anthropic Messages API client for vision audits

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clients::traits::VisionCapability;
use crate::config::CapabilityConfig;
use crate::error::{AuditError, Result};
use crate::prompts::{ContentPart, VisionPrompt};

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a [ContentPart],
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicClient {
    client: reqwest::Client,
    settings: CapabilityConfig,
    api_key: Option<String>,
}

impl AnthropicClient {
    /// The credential is injected rather than read here; `None` makes every call
    /// fail with `CapabilityUnavailable`.
    pub fn new(settings: CapabilityConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|e| AuditError::Config {
                message: format!("Failed to build reqwest client with timeout: {e}"),
            })?;

        Ok(Self {
            client,
            settings,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl VisionCapability for AnthropicClient {
    async fn complete(&self, prompt: &VisionPrompt) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AuditError::CapabilityUnavailable {
                message: "ANTHROPIC_API_KEY not configured".to_string(),
            })?;

        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            system: &prompt.system,
            messages: [UserMessage {
                role: "user",
                content: &prompt.parts,
            }],
        };

        debug!(
            "Calling Anthropic messages API (model={}, images={}, max_tokens={})",
            self.settings.model,
            prompt.image_count(),
            self.settings.max_tokens
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.settings.anthropic_version)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            return Err(AuditError::TransportFailure {
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("non-success status")
                    .to_string(),
                body: raw,
            });
        }

        parse_reply(status.as_u16(), raw)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// Concatenate the text blocks of a successful reply
fn parse_reply(status: u16, raw: String) -> Result<String> {
    let parsed: MessagesResponse = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Err(AuditError::TransportFailure {
                status: Some(status),
                message: format!("unreadable response envelope: {e}"),
                body: raw,
            });
        }
    };

    if parsed.stop_reason.as_deref() == Some("max_tokens") {
        warn!("Anthropic reply hit max_tokens; the JSON payload may be truncated");
    }

    let text: String = parsed
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(AuditError::TransportFailure {
            status: Some(status),
            message: "response contained no text content".to_string(),
            body: raw,
        });
    }

    Ok(text)
}
