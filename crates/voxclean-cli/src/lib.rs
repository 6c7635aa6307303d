//! Command-line front end for voxclean.
//!
//! Resolves paths and the policy source from arguments and environment,
//! then runs the batch.

pub mod args;
pub mod batch;
pub mod config;
pub mod error;
pub mod logging;

use std::path::PathBuf;
use tracing::info;

use voxclean_media::{FfmpegMeasurements, ProcessOptions};
use voxclean_models::{FilterChainConfig, Profile};

pub use args::Args;
pub use batch::{discover_jobs, run_batch, BatchSummary, ClipJob, PolicySource, RunOptions};
pub use config::{load_filter_config, CliConfig};
pub use error::{CliError, CliResult};
pub use logging::{init_tracing, ClipLogger};

/// Paths a run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config_file: PathBuf,
    /// The config file was named explicitly rather than defaulted
    pub config_explicit: bool,
}

/// Resolve input, output and config paths, honouring `auto` mode.
pub fn resolve_paths(args: &Args, config: &CliConfig) -> CliResult<RunPaths> {
    if args.is_auto() {
        return Ok(RunPaths {
            input: config.input_dir.clone(),
            output: config.output_dir.clone(),
            config_file: config.config_file.clone(),
            config_explicit: false,
        });
    }

    let input = args
        .input
        .as_ref()
        .map(PathBuf::from)
        .ok_or_else(|| CliError::config("INPUT path is required"))?;
    let output = args
        .output
        .clone()
        .ok_or_else(|| CliError::config("OUTPUT path is required when not using 'auto' mode"))?;

    Ok(RunPaths {
        input,
        output,
        config_file: args.config.clone().unwrap_or_else(|| config.config_file.clone()),
        config_explicit: args.config.is_some(),
    })
}

/// Pick where filter configurations come from.
///
/// `--profile` selects per-clip analysis. Otherwise the config file is
/// loaded; a missing default config file also selects analysis with the
/// default profile.
pub fn select_policy(args: &Args, paths: &RunPaths) -> CliResult<PolicySource> {
    if let Some(profile) = args.profile {
        return Ok(PolicySource::Auto(profile));
    }

    if !paths.config_explicit && !paths.config_file.exists() {
        info!(
            config = %paths.config_file.display(),
            "No filter config found, generating policies from analysis"
        );
        return Ok(PolicySource::Auto(Profile::default()));
    }

    let config = load_filter_config(&paths.config_file)?;
    info!(
        config = %paths.config_file.display(),
        filters = config.filters.len(),
        "Loaded filter config"
    );
    Ok(PolicySource::File(config))
}

/// JSON Schema of the filter config file.
pub fn filter_config_schema() -> CliResult<String> {
    let schema = schemars::schema_for!(FilterChainConfig);
    serde_json::to_string_pretty(&schema).map_err(|e| CliError::config(e.to_string()))
}

/// Run the whole batch described by the arguments.
pub async fn run(args: &Args, config: &CliConfig) -> CliResult<BatchSummary> {
    let paths = resolve_paths(args, config)?;
    let policy = select_policy(args, &paths)?;
    let jobs = discover_jobs(&paths.input, &paths.output, &config.extensions)?;

    if paths.input.is_dir() && !args.dry_run {
        tokio::fs::create_dir_all(&paths.output).await?;
    }

    let options = RunOptions {
        max_jobs: args.jobs.filter(|n| *n > 0).unwrap_or(config.max_jobs),
        validate: args.validate,
        dry_run: args.dry_run,
        process: ProcessOptions {
            overwrite: !args.no_overwrite,
            timeout_secs: config.ffmpeg_timeout_secs,
        },
    };

    let source = match config.ffmpeg_timeout_secs {
        Some(secs) => FfmpegMeasurements::new().with_timeout(secs),
        None => FfmpegMeasurements::new(),
    };

    info!(
        input = %paths.input.display(),
        output = %paths.output.display(),
        clips = jobs.len(),
        max_jobs = options.max_jobs,
        "Starting batch"
    );

    let summary = run_batch(&jobs, &policy, &source, &options).await;

    info!(
        processed = summary.processed,
        failed = summary.failed,
        validation_failures = summary.validation_failures,
        "Batch finished"
    );

    if summary.failed > 0 {
        return Err(CliError::BatchFailed {
            failed: summary.failed,
            total: summary.total,
        });
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_auto_mode_uses_configured_paths() {
        let config = CliConfig::default();
        let paths = resolve_paths(&parse(&["voxclean", "auto", "ignored"]), &config).unwrap();
        assert_eq!(paths.input, PathBuf::from("data/fixtures"));
        assert_eq!(paths.output, PathBuf::from("data/output"));
        assert_eq!(paths.config_file, PathBuf::from("config/filters.json"));
        assert!(!paths.config_explicit);
    }

    #[test]
    fn test_output_required_outside_auto_mode() {
        let result = resolve_paths(&parse(&["voxclean", "in.mp4"]), &CliConfig::default());
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_explicit_config_path() {
        let paths = resolve_paths(
            &parse(&["voxclean", "in.mp4", "out.mp4", "--config", "my.json"]),
            &CliConfig::default(),
        )
        .unwrap();
        assert_eq!(paths.config_file, PathBuf::from("my.json"));
        assert!(paths.config_explicit);
    }

    #[test]
    fn test_profile_selects_analysis() {
        let args = parse(&["voxclean", "in.mp4", "out.mp4", "--profile", "aggressive"]);
        let paths = resolve_paths(&args, &CliConfig::default()).unwrap();
        assert!(matches!(
            select_policy(&args, &paths).unwrap(),
            PolicySource::Auto(Profile::Aggressive)
        ));
    }

    #[test]
    fn test_missing_default_config_selects_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            config_file: dir.path().join("filters.json"),
            ..Default::default()
        };
        let args = parse(&["voxclean", "in.mp4", "out.mp4"]);
        let paths = resolve_paths(&args, &config).unwrap();
        assert!(matches!(
            select_policy(&args, &paths).unwrap(),
            PolicySource::Auto(Profile::Light)
        ));
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let args = parse(&["voxclean", "in.mp4", "out.mp4", "-c", "/nonexistent/filters.json"]);
        let paths = resolve_paths(&args, &CliConfig::default()).unwrap();
        assert!(matches!(select_policy(&args, &paths), Err(CliError::ConfigRead { .. })));
    }

    #[test]
    fn test_schema_describes_audio_filters() {
        let schema = filter_config_schema().unwrap();
        assert!(schema.contains("audio_filters"));
        assert!(schema.contains("audio_codec"));
    }
}
