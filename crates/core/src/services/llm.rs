//! Chat-completion client used by news ingestion.

use std::time::Duration;

use async_trait::async_trait;
use fandom_common::{AppError, AppResult, config::LlmConfig};
use serde::Deserialize;
use tracing::debug;

/// Request timeout for one completion.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// A language model that answers a system + user prompt pair.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Return the model's answer text.
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String>;
}

/// `OpenAI`-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    /// Build a client from configuration. Fails when no API key is set.
    pub fn from_config(config: &LlmConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Config("llm.api_key is not set".to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.4,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("LLM request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "LLM API error: {status} - {body}"
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse LLM response: {e}"))
        })?;

        let answer = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::ExternalService("LLM returned no answer".to_string()))?;

        debug!(model = %self.model, chars = answer.len(), "LLM answered");
        Ok(answer)
    }
}
