//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Cannot read filter config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid filter config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: voxclean_models::ModelError,
    },

    #[error("{failed} of {total} clips failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Media error: {0}")]
    Media(#[from] voxclean_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
