//! HTTP-backed [`LanguageModel`] implementation speaking the Anthropic
//! Messages API shape, grounded on the teacher's `llm/src/claude.rs`
//! (endpoint/header construction, status-code handling) generalized to the
//! simple `(system_prompt, user_prompt) -> String` contract this crate's
//! callers need — no streaming or tool-calling, which the orchestrator
//! never uses.

use std::time::Duration;

use async_trait::async_trait;
use podcast_core::{LanguageModel, Result};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Debug, Clone)]
pub struct HttpLlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub timeout: Duration,
}

impl Default for HttpLlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            timeout: Duration::from_secs(180),
        }
    }
}

pub struct HttpLanguageModel {
    config: HttpLlmConfig,
    client: reqwest::Client,
}

impl HttpLanguageModel {
    pub fn new(config: HttpLlmConfig) -> std::result::Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration("LLM API key is not configured".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Network)?;
        Ok(Self { config, client })
    }

    /// Builds a client with a per-call timeout override, for callers that
    /// need the longer persona-research/outline budget (spec.md §5).
    pub fn with_timeout(&self, timeout: Duration) -> std::result::Result<Self, LlmError> {
        Self::new(HttpLlmConfig { timeout, ..self.config.clone() })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    system: &'a str,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: system_prompt,
            messages: vec![RequestMessage { role: "user", content: user_prompt }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(LlmError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body }.into());
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed.content.into_iter().map(|b| b.text).collect::<Vec<_>>().join("");
        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse("LLM response contained no text content".to_string()).into());
        }
        Ok(text)
    }
}
