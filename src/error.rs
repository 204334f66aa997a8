//! Error types for Mort.

use thiserror::Error;

/// Library-level error type for Mort operations.
#[derive(Error, Debug)]
pub enum MortError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MortError {
    /// Whether the failure came from an external service and may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MortError::Retrieval(_)
                | MortError::Completion(_)
                | MortError::Embedding(_)
                | MortError::Http(_)
                | MortError::OpenAI(_)
        )
    }
}

/// Result type alias for Mort operations.
pub type Result<T> = std::result::Result<T, MortError>;
