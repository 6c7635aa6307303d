//! Processing pipeline: resolve the policy, compile the graph, encode.

use std::borrow::Cow;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use voxclean_models::FilterChainConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::compile;
use crate::metrics::{self, fallback_reason};
use crate::policy::fallback_policy;
use crate::progress::FfmpegProgress;

/// Options for one encode run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Replace an existing output file
    pub overwrite: bool,
    /// Kill FFmpeg after this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            timeout_secs: None,
        }
    }
}

impl ProcessOptions {
    fn runner(&self) -> FfmpegRunner {
        match self.timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        }
    }
}

/// Substitute the fallback policy for a configuration that compiles to nothing.
pub fn resolve_policy(config: &FilterChainConfig) -> Cow<'_, FilterChainConfig> {
    if config.has_filters() && !compile(&config.filters).is_empty() {
        return Cow::Borrowed(config);
    }

    warn!(
        filters = config.filters.len(),
        "No usable audio filters, using fallback policy"
    );
    metrics::record_fallback_policy(fallback_reason::EMPTY_FILTERS);
    Cow::Owned(fallback_policy())
}

/// Build the encode command for an already-resolved configuration.
///
/// Video is stream-copied; only the audio is filtered and re-encoded.
pub fn build_process_command(
    input: &Path,
    output: &Path,
    config: &FilterChainConfig,
    overwrite: bool,
) -> FfmpegCommand {
    let graph = compile(&config.filters);
    debug!(graph = %graph, "Compiled audio filter graph");

    FfmpegCommand::new(input, output)
        .copy_video()
        .audio_filter(graph)
        .encoder_args(config.to_ffmpeg_args())
        .overwrite(overwrite)
}

/// Clean one file. An encode failure is returned to the caller.
pub async fn process_file(
    input: &Path,
    output: &Path,
    config: &FilterChainConfig,
    options: &ProcessOptions,
) -> MediaResult<()> {
    process_file_with_progress(input, output, config, options, |_| {}).await
}

/// Clean one file, reporting FFmpeg progress.
pub async fn process_file_with_progress<F>(
    input: &Path,
    output: &Path,
    config: &FilterChainConfig,
    options: &ProcessOptions,
    progress_callback: F,
) -> MediaResult<()>
where
    F: Fn(FfmpegProgress) + Send + 'static,
{
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let config = resolve_policy(config);
    let cmd = build_process_command(input, output, &config, options.overwrite);

    info!(
        input = %input.display(),
        output = %output.display(),
        codec = %config.audio_codec,
        bitrate = %config.audio_bitrate,
        "Processing clip"
    );

    let started = Instant::now();
    let result = options.runner().run_with_progress(&cmd, progress_callback).await;
    let elapsed = started.elapsed().as_secs_f64();

    metrics::record_ffmpeg_duration(elapsed);
    metrics::record_clip_processed(result.is_ok());

    match &result {
        Ok(()) => info!(
            output = %output.display(),
            elapsed_secs = elapsed,
            "Clip processed"
        ),
        Err(e) => error!(
            input = %input.display(),
            kind = e.kind(),
            error = %e,
            "Clip processing failed"
        ),
    }

    result
}
