//! Input discovery and batch processing.

use futures::future::join_all;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, Instrument};

use voxclean_media::{
    auto_policy, build_process_command, process_file_with_progress, resolve_policy, validate_output,
    FfmpegProgress, MeasurementSource, ProcessOptions,
};
use voxclean_models::{FilterChainConfig, Profile};

use crate::error::{CliError, CliResult};
use crate::logging::ClipLogger;

/// One input/output pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Where each clip's filter configuration comes from.
#[derive(Debug, Clone)]
pub enum PolicySource {
    /// One configuration for every clip
    File(FilterChainConfig),
    /// Analyse each clip and generate its policy
    Auto(Profile),
}

/// Batch run options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub max_jobs: usize,
    pub validate: bool,
    pub dry_run: bool,
    pub process: ProcessOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_jobs: 1,
            validate: false,
            dry_run: false,
            process: ProcessOptions::default(),
        }
    }
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub validation_failures: usize,
}

enum ClipOutcome {
    Processed { validated: Option<bool> },
    Planned,
}

/// Whether a path has one of the given (lowercase, dotless) extensions.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| extensions.iter().any(|x| *x == e))
}

/// Map an input path to its jobs.
///
/// A directory yields one job per regular file with a matching extension,
/// written under `output` with the same file name. A single file goes to
/// `output`, or into it when `output` is an existing directory.
pub fn discover_jobs(
    input: &Path,
    output: &Path,
    extensions: &[String],
) -> CliResult<Vec<ClipJob>> {
    if input.is_dir() {
        let mut jobs = Vec::new();
        for entry in std::fs::read_dir(input)? {
            let path = entry?.path();
            if !path.is_file() || !has_extension(&path, extensions) {
                continue;
            }
            if let Some(name) = path.file_name() {
                jobs.push(ClipJob {
                    output: output.join(name),
                    input: path,
                });
            }
        }
        jobs.sort_by(|a, b| a.input.cmp(&b.input));
        return Ok(jobs);
    }

    if !input.is_file() {
        return Err(CliError::InputNotFound(input.to_path_buf()));
    }

    let output = match input.file_name() {
        Some(name) if output.is_dir() => output.join(name),
        _ => output.to_path_buf(),
    };

    Ok(vec![ClipJob {
        input: input.to_path_buf(),
        output,
    }])
}

/// Render an argument list as a copy-pasteable shell command.
pub fn format_command(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        let plain = arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
        if !arg.is_empty() && plain {
            line.push_str(arg);
        } else {
            line.push('\'');
            line.push_str(&arg.replace('\'', r"'\''"));
            line.push('\'');
        }
    }
    line
}

/// Process every job, at most `max_jobs` at a time.
///
/// A failed clip does not stop the others.
pub async fn run_batch(
    jobs: &[ClipJob],
    policy: &PolicySource,
    source: &dyn MeasurementSource,
    options: &RunOptions,
) -> BatchSummary {
    let semaphore = Semaphore::new(options.max_jobs.max(1));
    let semaphore = &semaphore;

    let futures: Vec<_> = jobs
        .iter()
        .enumerate()
        .map(|(index, job)| async move {
            let _permit = semaphore.acquire().await.ok();
            let logger = ClipLogger::new(&job.input, index, jobs.len());
            process_clip(job, &logger, policy, source, options).await
        })
        .collect();

    let results = join_all(futures).await;

    let mut summary = BatchSummary {
        total: jobs.len(),
        ..Default::default()
    };
    for result in results {
        match result {
            Ok(ClipOutcome::Processed { validated }) => {
                summary.processed += 1;
                if validated == Some(false) {
                    summary.validation_failures += 1;
                }
            }
            Ok(ClipOutcome::Planned) => {}
            Err(_) => summary.failed += 1,
        }
    }
    summary
}

async fn process_clip(
    job: &ClipJob,
    logger: &ClipLogger,
    policy: &PolicySource,
    source: &dyn MeasurementSource,
    options: &RunOptions,
) -> CliResult<ClipOutcome> {
    let span = logger.create_span();

    async {
        logger.log_start(&job.output.display().to_string());

        let config = match policy {
            PolicySource::File(config) => Cow::Borrowed(config),
            PolicySource::Auto(profile) => {
                let generated = auto_policy(source, &job.input, *profile).await;
                logger.log_progress(&format!(
                    "{} policy: {}",
                    profile,
                    generated.filter_names().join(", ")
                ));
                Cow::Owned(generated)
            }
        };

        if options.dry_run {
            let resolved = resolve_policy(&config);
            let cmd = build_process_command(
                &job.input,
                &job.output,
                &resolved,
                options.process.overwrite,
            );
            println!("{}", format_command("ffmpeg", &cmd.build_args()));
            return Ok(ClipOutcome::Planned);
        }

        let duration_secs = match source.duration(&job.input).await {
            Ok(secs) => Some(secs),
            Err(e) => {
                debug!(error = %e, "Input duration unavailable, progress shown as time only");
                None
            }
        };
        let reporter = ProgressReporter::new(logger.clone(), duration_secs);
        let progress = move |p: FfmpegProgress| reporter.report(p);

        let result = process_file_with_progress(
            &job.input,
            &job.output,
            &config,
            &options.process,
            progress,
        )
        .await;
        if let Err(e) = result {
            logger.log_error(&e.to_string());
            return Err(CliError::from(e));
        }

        let validated = if options.validate {
            let report = validate_output(source, &job.input, &job.output).await;
            if !report.ok {
                logger.log_warning(&report.message);
            }
            Some(report.ok)
        } else {
            None
        };

        logger.log_completion(&job.output.display().to_string());
        Ok(ClipOutcome::Processed { validated })
    }
    .instrument(span)
    .await
}

/// Logs encode progress each time another tenth of the clip is done.
#[derive(Debug)]
struct ProgressReporter {
    logger: ClipLogger,
    duration_secs: Option<f64>,
    last_step: AtomicU64,
}

impl ProgressReporter {
    const STEPS: f64 = 10.0;

    fn new(logger: ClipLogger, duration_secs: Option<f64>) -> Self {
        Self {
            logger,
            duration_secs: duration_secs.filter(|d| *d > 0.0),
            last_step: AtomicU64::new(0),
        }
    }

    /// Message for a snapshot that crosses a new step, if any.
    fn message(&self, progress: &FfmpegProgress) -> Option<String> {
        let duration = self.duration_secs?;
        let fraction = progress.fraction_of(duration);
        let step = (fraction * Self::STEPS).floor() as u64;
        if step == 0 || self.last_step.fetch_max(step, Ordering::Relaxed) >= step {
            return None;
        }

        let percent = fraction * 100.0;
        Some(match progress.remaining_secs(duration) {
            Some(left) => format!("Encoded {:.0}%, about {:.0}s left", percent, left),
            None => format!("Encoded {:.0}%", percent),
        })
    }

    fn report(&self, progress: FfmpegProgress) {
        debug!(
            out_time = %progress.out_time,
            speed = progress.speed,
            complete = progress.is_complete,
            "Encode progress"
        );
        if let Some(message) = self.message(&progress) {
            self.logger.log_progress(&message);
        }
    }
}
