use thiserror::Error;

/// Errors raised while reading result sets and other core inputs.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was not valid JSON or did not match the expected shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// JSON parsed, but is not an array of row objects.
    #[error("invalid result set: {0}")]
    InvalidResultSet(String),
}

/// Convenience alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;
