//! Media error types.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

/// External program the pipeline shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tool::Ffmpeg => "FFmpeg",
            Tool::Ffprobe => "FFprobe",
        })
    }
}

/// Failure while measuring or cleaning a clip.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    ToolNotFound(Tool),

    /// The tool ran and exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    ToolFailed {
        tool: Tool,
        message: String,
        /// Tail of the tool's diagnostics
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Input not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("No audio stream in input")]
    NoAudioStream,

    #[error("Unreadable measurement: {0}")]
    Measurement(String),

    #[error("Malformed probe output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ToolFailed {
            tool: Tool::Ffmpeg,
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn ffprobe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ToolFailed {
            tool: Tool::Ffprobe,
            message: message.into(),
            stderr,
            exit_code: None,
        }
    }

    pub fn measurement(message: impl Into<String>) -> Self {
        Self::Measurement(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolNotFound(_) => "tool_not_found",
            Self::ToolFailed { .. } => "tool_failed",
            Self::FileNotFound(_) => "file_not_found",
            Self::Timeout(_) => "timeout",
            Self::NoAudioStream => "no_audio_stream",
            Self::Measurement(_) => "measurement",
            Self::JsonParse(_) => "json_parse",
            Self::Io(_) => "io",
            Self::Internal(_) => "internal",
        }
    }
}
