//! Processing metrics.
//!
//! Recorded through the `metrics` facade; nothing is collected unless the
//! binary installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const CLIPS_PROCESSED_TOTAL: &str = "voxclean_clips_processed_total";
    pub const FALLBACK_POLICY_TOTAL: &str = "voxclean_fallback_policy_total";
    pub const NOISE_REGIME_TOTAL: &str = "voxclean_noise_regime_total";
    pub const VALIDATION_FAILURES_TOTAL: &str = "voxclean_validation_failures_total";
    pub const FFMPEG_DURATION_SECONDS: &str = "voxclean_ffmpeg_duration_seconds";
}

/// Why the fallback policy replaced a generated or supplied one.
pub mod fallback_reason {
    pub const ANALYSIS_FAILED: &str = "analysis_failed";
    pub const EMPTY_FILTERS: &str = "empty_filters";
}

/// Record the outcome of one clip.
pub fn record_clip_processed(success: bool) {
    let status = if success { "success" } else { "failure" };
    let labels = [("status", status.to_string())];
    counter!(names::CLIPS_PROCESSED_TOTAL, &labels).increment(1);
}

/// Record a fallback-policy substitution.
pub fn record_fallback_policy(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::FALLBACK_POLICY_TOTAL, &labels).increment(1);
}

/// Record the regime a clip was classified into.
pub fn record_noise_regime(regime: &str) {
    let labels = [("regime", regime.to_string())];
    counter!(names::NOISE_REGIME_TOTAL, &labels).increment(1);
}

pub fn record_validation_failure(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::VALIDATION_FAILURES_TOTAL, &labels).increment(1);
}

/// Record wall time of one encode run.
pub fn record_ffmpeg_duration(duration_secs: f64) {
    histogram!(names::FFMPEG_DURATION_SECONDS).record(duration_secs);
}
