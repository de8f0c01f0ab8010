//! LLM step handler for OpenAI-compatible APIs

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::configuration::LlmConfig;
use crate::models::workflow::{StepKind, StepSpec};
use crate::workflow::executor::{StepContext, StepHandler};

/// Chat-completions request body
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat-completions response body (the parts we read)
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Step handler prompting an OpenAI-compatible chat-completions endpoint
///
/// Works with any endpoint speaking the OpenAI wire format. Non-streaming;
/// the step's rendered input becomes the single user message, and the
/// assistant text comes back as the step output. Request timeouts are
/// enforced here, never by the engine.
pub struct LlmStepHandler {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmStepHandler {
    /// Create a handler over a configuration
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// API key from the configured environment variable
    fn api_key(&self) -> Result<String> {
        std::env::var(&self.config.api_key_env).map_err(|_| {
            anyhow!(
                "API key environment variable '{}' is not set",
                self.config.api_key_env
            )
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl StepHandler for LlmStepHandler {
    async fn run(
        &self,
        step: &StepSpec,
        input: &str,
        ctx: &StepContext,
    ) -> Result<serde_json::Value> {
        let (model_override, temperature_override) = match &step.kind {
            StepKind::LlmCall { model, temperature } => (model.clone(), *temperature),
            other => {
                return Err(anyhow!(
                    "llm handler invoked for step kind '{}'",
                    other.tag()
                ))
            }
        };

        let request = ChatRequest {
            model: model_override.unwrap_or_else(|| self.config.model.clone()),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: input.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: temperature_override.or(self.config.temperature),
        };

        let timeout = Duration::from_secs(
            ctx.timeout_seconds.unwrap_or(self.config.timeout_seconds),
        );

        tracing::debug!(
            step_id = %step.id,
            model = %request.model,
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key()?)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Chat completion request returned {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Chat completion response contained no content"))?;

        Ok(serde_json::Value::String(content))
    }
}
