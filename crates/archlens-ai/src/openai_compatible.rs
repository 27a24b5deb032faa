use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use archlens_core::LlmConfig;

use crate::llm_provider::{GenerationConfig, LlmProvider, LlmResponse, LlmResult, Message};

const AVAILABILITY_TIMEOUT_SECS: u64 = 2;

/// Chat-completions client for OpenAI-compatible endpoints (LM Studio,
/// Ollama, or any server speaking the same protocol).
pub struct OpenAiCompatibleProvider {
    config: LlmConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.model.is_empty() {
            return Err(anyhow!(
                "LLM model is not configured; set llm.model to the model loaded on the endpoint"
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send a chat request with retry and exponential backoff.
    async fn send_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<ChatCompletionsResponse> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            match self.try_request(messages, config).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        warn!(
                            "LLM request failed (attempt {}/{}), retrying...",
                            attempt + 1,
                            self.config.max_retries + 1
                        );
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("All retry attempts failed")))
    }

    async fn try_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<ChatCompletionsResponse> {
        let request = ChatCompletionsRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: Some(config.temperature),
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            stop: config.stop.clone(),
        };

        let mut request_builder = self
            .client
            .post(self.endpoint("chat/completions"))
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(api_key) = &self.config.api_key {
            request_builder =
                request_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request_builder.send().await.context(format!(
            "Failed to send request to chat completions API at {}",
            self.config.base_url
        ))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("LLM API error ({}): {}", status, error_text));
        }

        response
            .json::<ChatCompletionsResponse>()
            .await
            .context("Failed to parse chat completions response")
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LlmResult<LlmResponse> {
        let response = self.send_request(messages, config).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| anyhow!("No choices in LLM response"))?;

        Ok(LlmResponse {
            content: choice.message.content.clone(),
            total_tokens: response.usage.as_ref().map(|u| u.total_tokens),
            prompt_tokens: response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: response.usage.as_ref().map(|u| u.completion_tokens),
            finish_reason: choice.finish_reason.clone(),
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    async fn is_available(&self) -> bool {
        // Short probe so an offline endpoint does not stall the pipeline.
        self.client
            .get(self.endpoint("models"))
            .timeout(Duration::from_secs(AVAILABILITY_TIMEOUT_SECS))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Wire types for the chat completions protocol.

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_provider::MessageRole;

    #[test]
    fn provider_requires_a_model() {
        let config = LlmConfig {
            model: String::new(),
            ..Default::default()
        };
        assert!(OpenAiCompatibleProvider::new(config).is_err());
    }

    #[test]
    fn endpoint_joins_without_duplicate_slashes() {
        let config = LlmConfig {
            base_url: "http://localhost:1234/v1/".to_string(),
            ..Default::default()
        };
        let provider = OpenAiCompatibleProvider::new(config).unwrap();
        assert_eq!(
            provider.endpoint("chat/completions"),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(provider.endpoint("models"), "http://localhost:1234/v1/models");
    }

    #[test]
    fn request_serializes_roles_lowercase() {
        let message = Message {
            role: MessageRole::User,
            content: "hi".into(),
        };
        assert_eq!(message.role.to_string(), "user");
    }
}
