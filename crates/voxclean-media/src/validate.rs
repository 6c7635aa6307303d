//! Post-processing output validation.

use std::path::Path;
use tracing::{debug, warn};

use voxclean_models::features::DEFAULT_PEAK_LEVEL_DB;
use voxclean_models::ValidationReport;

use crate::measure::peak_level_db;
use crate::metrics;
use crate::source::MeasurementSource;

/// Allowed difference between input and output duration, in seconds.
pub const MAX_DURATION_DRIFT_SECS: f64 = 0.1;
/// Output peak level above which residual clipping is reported.
pub const MAX_OUTPUT_PEAK_DB: f64 = -0.5;

/// Check duration drift and residual clipping.
pub fn validate(
    input_duration: f64,
    output_duration: f64,
    output_peak_level_db: f64,
) -> ValidationReport {
    if (input_duration - output_duration).abs() > MAX_DURATION_DRIFT_SECS {
        return ValidationReport::failed(format!(
            "Duration mismatch: input={:.2}s, output={:.2}s",
            input_duration, output_duration
        ));
    }

    if output_peak_level_db > MAX_OUTPUT_PEAK_DB {
        return ValidationReport::failed(format!(
            "Residual clipping detected: peak={:.2}dB",
            output_peak_level_db
        ));
    }

    ValidationReport::passed(format!(
        "Output valid: duration={:.2}s, peak={:.2}dB",
        output_duration, output_peak_level_db
    ))
}

/// Measure a processed file against its input and validate it.
///
/// Collaborator failures become a failed report carrying the cause. The
/// peak run is skipped when the durations already disagree.
pub async fn validate_output(
    source: &dyn MeasurementSource,
    input: &Path,
    output: &Path,
) -> ValidationReport {
    let report = match check(source, input, output).await {
        Ok(report) => report,
        Err(message) => ValidationReport::failed(message),
    };

    if report.ok {
        debug!(output = %output.display(), message = %report.message, "Output validated");
    } else {
        metrics::record_validation_failure(failure_kind(&report));
        warn!(output = %output.display(), message = %report.message, "Output validation failed");
    }

    report
}

async fn check(
    source: &dyn MeasurementSource,
    input: &Path,
    output: &Path,
) -> Result<ValidationReport, String> {
    let input_duration = source
        .duration(input)
        .await
        .map_err(|e| format!("Validation error: input duration unavailable: {}", e))?;
    let output_duration = source
        .duration(output)
        .await
        .map_err(|e| format!("Validation error: output duration unavailable: {}", e))?;

    if (input_duration - output_duration).abs() > MAX_DURATION_DRIFT_SECS {
        return Ok(validate(input_duration, output_duration, DEFAULT_PEAK_LEVEL_DB));
    }

    let stats = source
        .peak_astats(output)
        .await
        .map_err(|e| format!("Validation error: output peak unavailable: {}", e))?;

    Ok(validate(input_duration, output_duration, peak_level_db(&stats)))
}

fn failure_kind(report: &ValidationReport) -> &'static str {
    if report.message.starts_with("Duration mismatch") {
        "duration"
    } else if report.message.starts_with("Residual clipping") {
        "clipping"
    } else {
        "measurement"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::{Reply, Script, ScriptedSource};

    #[test]
    fn test_small_drift_passes() {
        let report = validate(10.0, 10.05, -1.0);
        assert!(report.ok, "{}", report);
    }

    #[test]
    fn test_duration_mismatch() {
        let report = validate(10.0, 10.5, -1.0);
        assert!(!report.ok);
        assert!(report.message.to_lowercase().contains("mismatch"));
    }

    #[test]
    fn test_residual_clipping() {
        let report = validate(10.0, 10.0, -0.2);
        assert!(!report.ok);
        assert!(report.message.to_lowercase().contains("clipping"));
    }

    #[test]
    fn test_limits_are_exclusive() {
        assert!(validate(10.0, 10.0, -0.5).ok);
        assert!(validate(10.0, 10.1, -1.0).ok);
    }

    fn clip(duration: f64) -> Script {
        Script {
            duration: Reply::Value(duration),
            peak_astats: Reply::Value("Peak level dB: -1.200000\n".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_validate_output_measures_both_files() {
        let source = ScriptedSource::new().with("in.mp4", clip(12.0)).with("out.mp4", clip(12.02));
        let report = validate_output(&source, Path::new("in.mp4"), Path::new("out.mp4")).await;
        assert!(report.ok, "{}", report);
    }

    #[tokio::test]
    async fn test_collaborator_error_becomes_failed_report() {
        let broken = Script {
            duration: Reply::Fail("ffprobe exploded"),
            ..clip(0.0)
        };
        let source = ScriptedSource::new().with("in.mp4", clip(12.0)).with("out.mp4", broken);
        let report = validate_output(&source, Path::new("in.mp4"), Path::new("out.mp4")).await;
        assert!(!report.ok);
        assert!(report.message.contains("ffprobe exploded"));
    }

    #[tokio::test]
    async fn test_missing_peak_uses_default_level() {
        let silent = Script {
            peak_astats: Reply::Value("Peak level dB: -\n".to_string()),
            ..clip(12.0)
        };
        let source = ScriptedSource::new().with("in.mp4", clip(12.0)).with("out.mp4", silent);
        let report = validate_output(&source, Path::new("in.mp4"), Path::new("out.mp4")).await;
        assert!(report.ok, "{}", report);
    }

    #[tokio::test]
    async fn test_mismatch_skips_peak_measurement() {
        let short = Script {
            peak_astats: Reply::Fail("should not run"),
            ..clip(8.0)
        };
        let source = ScriptedSource::new().with("in.mp4", clip(12.0)).with("out.mp4", short);
        let report = validate_output(&source, Path::new("in.mp4"), Path::new("out.mp4")).await;
        assert!(!report.ok);
        assert!(report.message.starts_with("Duration mismatch"));
    }

    #[tokio::test]
    async fn test_clipped_output_fails() {
        let hot = Script {
            peak_astats: Reply::Value("Peak level dB: -0.100000\n".to_string()),
            ..clip(12.0)
        };
        let source = ScriptedSource::new().with("in.mp4", clip(12.0)).with("out.mp4", hot);
        let report = validate_output(&source, Path::new("in.mp4"), Path::new("out.mp4")).await;
        assert!(!report.ok);
        assert!(report.message.contains("clipping"));
    }

    #[test]
    fn test_failure_kind() {
        assert_eq!(failure_kind(&validate(1.0, 5.0, -3.0)), "duration");
        assert_eq!(failure_kind(&validate(1.0, 1.0, 0.0)), "clipping");
        assert_eq!(failure_kind(&ValidationReport::failed("Validation error: x")), "measurement");
    }
}
