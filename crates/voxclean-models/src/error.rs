//! Error types for model parsing and validation.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while parsing or validating models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Unknown noise regime: {0}")]
    UnknownRegime(String),

    #[error("Invalid filter config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("Invalid filter spec: {0}")]
    InvalidFilter(String),
}

impl ModelError {
    /// Create an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }
}
