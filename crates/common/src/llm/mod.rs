//! LLM client abstraction
//!
//! Provides a unified interface over OpenAI-compatible chat completion
//! providers. Generation steps call this directly; a failed call fails
//! the owning paper or document rather than being retried.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for chat completion providers
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run a single completion and return the assistant text
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Run a completion that must produce a JSON value.
    ///
    /// Providers often wrap JSON output in a markdown code fence; the
    /// fence is stripped before parsing.
    async fn complete_json(&self, system: &str, user: &str) -> Result<serde_json::Value> {
        let raw = self.complete(system, user).await?;
        let stripped = strip_code_fence(&raw);
        serde_json::from_str(stripped).map_err(|e| AppError::LlmError {
            message: format!("Model returned invalid JSON: {}", e),
        })
    }
}

/// Remove a surrounding ```json / ``` fence if present
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    rest.strip_suffix("```").map(str::trim).unwrap_or(trimmed)
}

/// OpenAI-compatible chat completion client
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_ms: u64,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiChat {
    /// Create a new client from configuration
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "LLM API key required for openai provider".to_string(),
            })?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::LlmTimeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    AppError::LlmError {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::LlmError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: ChatResponse = response.json().await.map_err(|e| AppError::LlmError {
            message: format!("Failed to parse response: {}", e),
        })?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::LlmError {
                message: "Empty response from provider".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock LLM for testing.
///
/// Returns queued responses in order, then falls back to a fixed
/// string. `failing()` builds one whose calls all error.
pub struct MockLlm {
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
    fail: std::sync::atomic::AtomicBool,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: std::sync::Mutex::new(std::collections::VecDeque::new()),
            fail: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn with_responses(responses: Vec<&str>) -> Self {
        let mock = Self::new();
        {
            let mut queue = mock.responses.lock().unwrap();
            queue.extend(responses.into_iter().map(String::from));
        }
        mock
    }

    pub fn failing() -> Self {
        let mock = Self::new();
        mock.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        mock
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::LlmError {
                message: "mock failure".to_string(),
            });
        }
        let mut queue = self.responses.lock().unwrap();
        Ok(queue
            .pop_front()
            .unwrap_or_else(|| "mock completion".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}

/// Create an LLM client based on configuration
pub fn create_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiChat::new(config)?)),
        "mock" => Ok(Arc::new(MockLlm::new())),
        other => {
            tracing::warn!(provider = other, "Unknown LLM provider, using mock");
            Ok(Arc::new(MockLlm::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_queued_responses() {
        let llm = MockLlm::with_responses(vec!["first", "second"]);
        assert_eq!(llm.complete("s", "u").await.unwrap(), "first");
        assert_eq!(llm.complete("s", "u").await.unwrap(), "second");
        assert_eq!(llm.complete("s", "u").await.unwrap(), "mock completion");
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let llm = MockLlm::failing();
        assert!(llm.complete("s", "u").await.is_err());
    }

    #[tokio::test]
    async fn test_complete_json_strips_fence() {
        let llm = MockLlm::with_responses(vec!["```json\n{\"score\": 85}\n```"]);
        let value = llm.complete_json("s", "u").await.unwrap();
        assert_eq!(value["score"], 85);
    }

    #[tokio::test]
    async fn test_complete_json_rejects_garbage() {
        let llm = MockLlm::with_responses(vec!["not json at all"]);
        assert!(llm.complete_json("s", "u").await.is_err());
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        // Unterminated fence falls back to the trimmed input
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), "```json\n{\"a\":1}");
    }
}
