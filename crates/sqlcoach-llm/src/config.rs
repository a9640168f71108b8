use std::time::Duration;

/// Connection and sampling settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
    /// Total attempts per request, including the first.
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub retry_delay: Duration,
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://llm:8080/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            temperature: 0.7,
            max_tokens: 2000,
            retry_delay: Duration::from_secs(1),
            api_key: None,
        }
    }
}

impl LlmConfig {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}
