//! Logging setup and structured clip logging.

use std::path::Path;
use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing: colored output by default, JSON when `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voxclean=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Per-clip logger; every event carries the clip and its place in the batch.
#[derive(Debug, Clone)]
pub struct ClipLogger {
    clip: String,
    position: String,
}

impl ClipLogger {
    /// Logger for clip `index` (zero-based) of `total`.
    pub fn new(clip: &Path, index: usize, total: usize) -> Self {
        let clip = clip
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| clip.display().to_string());
        Self {
            clip,
            position: format!("{}/{}", index + 1, total),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(clip = %self.clip, position = %self.position, "Cleaning into {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(clip = %self.clip, position = %self.position, "{}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(clip = %self.clip, position = %self.position, "{}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(clip = %self.clip, position = %self.position, "Clip failed: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(clip = %self.clip, position = %self.position, "Wrote {}", message);
    }

    pub fn clip(&self) -> &str {
        &self.clip
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("clip", clip = %self.clip, position = %self.position)
    }
}
