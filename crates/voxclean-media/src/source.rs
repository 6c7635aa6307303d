//! Measurement collaborators.
//!
//! The analysis and validation steps only consume text and numbers; where
//! they come from is behind [`MeasurementSource`]. [`FfmpegMeasurements`]
//! runs one ffprobe/ffmpeg process per call and returns once it exits.

use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::command::{check_ffmpeg, create_ffmpeg_command};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_audio_stream_json, probe_duration};

/// Windowed statistics, one dump per analysis window.
pub const WINDOWED_ASTATS_FILTER: &str = "astats=metadata=1:reset=1";
/// Whole-file statistics.
pub const ASTATS_FILTER: &str = "astats=metadata=1";
pub const VOLUMEDETECT_FILTER: &str = "volumedetect";

/// Source of the raw measurements the pipeline consumes.
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// FFprobe JSON for the first audio stream.
    async fn probe_stream(&self, path: &Path) -> MediaResult<String>;

    /// Diagnostic text of a windowed `astats` run.
    async fn astats(&self, path: &Path) -> MediaResult<String>;

    /// Diagnostic text of a `volumedetect` run.
    async fn volumedetect(&self, path: &Path) -> MediaResult<String>;

    /// Diagnostic text of a whole-file `astats` run.
    async fn peak_astats(&self, path: &Path) -> MediaResult<String>;

    /// Container duration in seconds.
    async fn duration(&self, path: &Path) -> MediaResult<f64>;
}

/// Measurements taken by running FFmpeg and FFprobe.
#[derive(Debug, Default, Clone)]
pub struct FfmpegMeasurements {
    timeout_secs: Option<u64>,
}

impl FfmpegMeasurements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each analysis run.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Decode the file through one audio filter and return FFmpeg's stderr.
    ///
    /// A non-zero exit still yields the text written so far; the parsers
    /// treat anything missing as unavailable.
    async fn filter_diagnostics(&self, path: &Path, filter: &str) -> MediaResult<String> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        check_ffmpeg()?;

        let mut cmd = create_ffmpeg_command();
        cmd.arg("-nostats")
            .arg("-i")
            .arg(path)
            .args(["-vn", "-af", filter, "-f", "null", "-"])
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let output = self.run(cmd).await?;
        if !output.status.success() {
            debug!(
                path = %path.display(),
                filter,
                exit_code = ?output.status.code(),
                "Analysis run exited with non-zero status"
            );
        }

        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }

    async fn run(&self, mut cmd: Command) -> MediaResult<Output> {
        let Some(secs) = self.timeout_secs else {
            return Ok(cmd.output().await?);
        };
        match tokio::time::timeout(Duration::from_secs(secs), cmd.output()).await {
            Ok(output) => Ok(output?),
            // The child is killed on drop
            Err(_) => Err(MediaError::Timeout(secs)),
        }
    }
}

#[async_trait]
impl MeasurementSource for FfmpegMeasurements {
    async fn probe_stream(&self, path: &Path) -> MediaResult<String> {
        probe_audio_stream_json(path).await
    }

    async fn astats(&self, path: &Path) -> MediaResult<String> {
        self.filter_diagnostics(path, WINDOWED_ASTATS_FILTER).await
    }

    async fn volumedetect(&self, path: &Path) -> MediaResult<String> {
        self.filter_diagnostics(path, VOLUMEDETECT_FILTER).await
    }

    async fn peak_astats(&self, path: &Path) -> MediaResult<String> {
        self.filter_diagnostics(path, ASTATS_FILTER).await
    }

    async fn duration(&self, path: &Path) -> MediaResult<f64> {
        probe_duration(path).await
    }
}
