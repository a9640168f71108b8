use sqlcoach_core::codes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("could not reach the LLM service: {0}")]
    Connection(String),
    #[error("LLM request timed out after {seconds}s")]
    Timeout { seconds: f64 },
    #[error("LLM API returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("LLM request failed: {0}")]
    Request(String),
    #[error("invalid LLM response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub fn code(&self) -> &'static str {
        match self {
            LlmError::Connection(_) | LlmError::HttpStatus { .. } => codes::LLM_CONNECTION,
            LlmError::Timeout { .. } => codes::LLM_TIMEOUT,
            LlmError::InvalidResponse(_) => codes::LLM_INVALID_RESPONSE,
            LlmError::Request(_) => codes::LLM_GENERATION_FAILED,
        }
    }

    /// Whether another attempt could succeed. Malformed bodies are not retried.
    pub fn is_transient(&self) -> bool {
        !matches!(self, LlmError::InvalidResponse(_))
    }
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;
