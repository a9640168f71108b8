use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{LlmError, LlmResult};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(15);
const HEALTH_CHECK_MAX_TOKENS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Per-call replacements for the configured sampling settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionOverrides {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct RawCompletion {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Option<Vec<RawChoice>>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    content: Option<String>,
}

/// A chat completion whose first choice is known to carry content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    pub model: Option<String>,
    content: String,
}

impl ChatCompletion {
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl TryFrom<RawCompletion> for ChatCompletion {
    type Error = LlmError;

    fn try_from(raw: RawCompletion) -> LlmResult<Self> {
        let choices = raw
            .choices
            .ok_or_else(|| invalid("'choices' field missing"))?;
        let choice = choices
            .into_iter()
            .next()
            .ok_or_else(|| invalid("empty choices array"))?;
        let message = choice
            .message
            .ok_or_else(|| invalid("'message' field missing in choice"))?;
        let content = message
            .content
            .ok_or_else(|| invalid("'content' field missing in message"))?;

        Ok(ChatCompletion {
            model: raw.model,
            content,
        })
    }
}

fn invalid(reason: &str) -> LlmError {
    LlmError::InvalidResponse(format!(
        "expected an OpenAI chat completion: {reason}"
    ))
}

/// HTTP client for `POST {api_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| LlmError::Request(err.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send `messages`, retrying transient failures up to
    /// `max_retries` attempts in total.
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        overrides: CompletionOverrides,
    ) -> LlmResult<ChatCompletion> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: overrides.temperature.unwrap_or(self.config.temperature),
            max_tokens: overrides.max_tokens.unwrap_or(self.config.max_tokens),
            stream: false,
        };

        let attempts = self.config.max_retries.max(1);
        let mut attempt = 1;
        loop {
            match self.send(&request).await {
                Ok(completion) => {
                    tracing::debug!(event = "llm_completion_received", attempt);
                    return Ok(completion);
                }
                Err(err) if attempt < attempts && err.is_transient() => {
                    tracing::warn!(
                        event = "llm_attempt_failed",
                        attempt,
                        attempts,
                        code = err.code(),
                        error = %err
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(
                        event = "llm_request_failed",
                        attempt,
                        code = err.code(),
                        error = %err
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn send(&self, request: &ChatRequest<'_>) -> LlmResult<ChatCompletion> {
        let mut builder = self.http.post(self.config.completions_url()).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let raw: RawCompletion = response.json().await.map_err(|err| {
            if err.is_timeout() {
                self.timeout_error()
            } else {
                LlmError::InvalidResponse(err.to_string())
            }
        })?;
        ChatCompletion::try_from(raw)
    }

    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            self.timeout_error()
        } else if err.is_connect() {
            LlmError::Connection(err.to_string())
        } else {
            LlmError::Request(err.to_string())
        }
    }

    fn timeout_error(&self) -> LlmError {
        LlmError::Timeout {
            seconds: self.config.timeout.as_secs_f64(),
        }
    }

    /// Trimmed text of the first choice.
    pub fn extract_content(completion: &ChatCompletion) -> &str {
        completion.content().trim()
    }

    /// Send a five-token "Hello" and report whether the endpoint answered 200.
    pub async fn check_health(&self) -> bool {
        let messages = [ChatMessage::user("Hello")];
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": HEALTH_CHECK_MAX_TOKENS,
        });

        let mut builder = self
            .http
            .post(self.config.completions_url())
            .timeout(HEALTH_CHECK_TIMEOUT)
            .json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        match builder.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(event = "llm_health_ok", model = %self.config.model);
                true
            }
            Ok(response) => {
                tracing::warn!(event = "llm_health_failed", status = response.status().as_u16());
                false
            }
            Err(err) => {
                tracing::warn!(event = "llm_health_failed", error = %err);
                false
            }
        }
    }
}
