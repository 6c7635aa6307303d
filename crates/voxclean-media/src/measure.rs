//! Loudness measurement extraction from FFmpeg diagnostic text.
//!
//! Two diagnostic formats are understood:
//! - `astats` per-window dumps: zero or more `RMS level dB: <n>` and
//!   `Peak level dB: <n>` lines (one per channel and window).
//! - `volumedetect` summaries: one `mean_volume: <n> dB` and one
//!   `max_volume: <n> dB` line.
//!
//! Every extractor is total. A missing line, a `-` placeholder, an
//! unparseable number or a non-finite value (`-inf` on digital silence)
//! makes that single field absent; absent fields resolve to the documented
//! defaults independently of each other.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use voxclean_models::features::{
    CLIPPING_PEAK_DB, DEFAULT_DYNAMIC_RANGE_DB, DEFAULT_MAX_VOLUME_DB, DEFAULT_MEAN_VOLUME_DB,
    DEFAULT_PEAK_LEVEL_DB, DEFAULT_RMS_LEVEL_DB,
};
use voxclean_models::AudioFeatures;

use crate::probe::StreamInfo;

static RMS_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RMS level dB:\s*(\S+)").expect("RMS level pattern"));
static PEAK_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Peak level dB:\s*(\S+)").expect("peak level pattern"));
static MEAN_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"mean_volume:\s*(\S+)\s*dB").expect("mean volume pattern"));
static MAX_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"max_volume:\s*(\S+)\s*dB").expect("max volume pattern"));

/// Placeholder the statistics tool prints for a value it cannot compute.
const UNAVAILABLE: &str = "-";

/// Levels measured by a windowed `astats` run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AstatsMeasurement {
    /// Mean of all RMS windows
    pub rms_level_db: Option<f64>,
    /// Maximum of all peak windows
    pub peak_level_db: Option<f64>,
}

/// Levels measured by a `volumedetect` run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeMeasurement {
    pub mean_volume_db: Option<f64>,
    pub max_volume_db: Option<f64>,
}

fn parse_level(token: &str) -> Option<f64> {
    if token == UNAVAILABLE {
        return None;
    }
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn all_levels(pattern: &Regex, text: &str) -> Vec<f64> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| parse_level(m.as_str()))
        .collect()
}

fn first_level(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_level(m.as_str()))
}

/// All valid `RMS level dB` values, in order of appearance.
pub fn find_rms_levels(text: &str) -> Vec<f64> {
    all_levels(&RMS_LEVEL, text)
}

/// All valid `Peak level dB` values, in order of appearance.
pub fn find_peak_levels(text: &str) -> Vec<f64> {
    all_levels(&PEAK_LEVEL, text)
}

/// Arithmetic mean of the RMS windows, if any were reported.
pub fn measured_rms_level_db(text: &str) -> Option<f64> {
    let levels = find_rms_levels(text);
    if levels.is_empty() {
        return None;
    }
    Some(levels.iter().sum::<f64>() / levels.len() as f64)
}

/// Worst-case (closest to 0 dBFS) peak window, if any were reported.
pub fn measured_peak_level_db(text: &str) -> Option<f64> {
    find_peak_levels(text).into_iter().reduce(f64::max)
}

pub fn measured_mean_volume_db(text: &str) -> Option<f64> {
    first_level(&MEAN_VOLUME, text)
}

pub fn measured_max_volume_db(text: &str) -> Option<f64> {
    first_level(&MAX_VOLUME, text)
}

/// Mean RMS level, `-30.0` when unavailable.
pub fn rms_level_db(text: &str) -> f64 {
    measured_rms_level_db(text).unwrap_or(DEFAULT_RMS_LEVEL_DB)
}

/// Maximum peak level, `-3.0` when unavailable.
pub fn peak_level_db(text: &str) -> f64 {
    measured_peak_level_db(text).unwrap_or(DEFAULT_PEAK_LEVEL_DB)
}

/// Summary mean volume, `-20.0` when unavailable.
pub fn mean_volume_db(text: &str) -> f64 {
    measured_mean_volume_db(text).unwrap_or(DEFAULT_MEAN_VOLUME_DB)
}

/// Summary max volume, `0.0` when unavailable.
pub fn max_volume_db(text: &str) -> f64 {
    measured_max_volume_db(text).unwrap_or(DEFAULT_MAX_VOLUME_DB)
}

pub fn parse_astats(text: &str) -> AstatsMeasurement {
    AstatsMeasurement {
        rms_level_db: measured_rms_level_db(text),
        peak_level_db: measured_peak_level_db(text),
    }
}

pub fn parse_volumedetect(text: &str) -> VolumeMeasurement {
    VolumeMeasurement {
        mean_volume_db: measured_mean_volume_db(text),
        max_volume_db: measured_max_volume_db(text),
    }
}

/// Distance between peak and RMS; `20.0` unless both were measured.
pub fn dynamic_range_db(peak_level_db: Option<f64>, rms_level_db: Option<f64>) -> f64 {
    match (peak_level_db, rms_level_db) {
        (Some(peak), Some(rms)) => (peak - rms).abs(),
        _ => DEFAULT_DYNAMIC_RANGE_DB,
    }
}

/// Assemble the feature record for one clip.
pub fn build_features(
    stream: &StreamInfo,
    astats: &AstatsMeasurement,
    volume: &VolumeMeasurement,
) -> AudioFeatures {
    let rms = resolve("rms_level_db", astats.rms_level_db, DEFAULT_RMS_LEVEL_DB);
    let peak = resolve("peak_level_db", astats.peak_level_db, DEFAULT_PEAK_LEVEL_DB);
    let mean = resolve("mean_volume_db", volume.mean_volume_db, DEFAULT_MEAN_VOLUME_DB);
    let max = resolve("max_volume_db", volume.max_volume_db, DEFAULT_MAX_VOLUME_DB);

    AudioFeatures {
        sample_rate: stream.sample_rate,
        channels: stream.channels,
        duration: stream.duration,
        rms_level_db: rms,
        peak_level_db: peak,
        mean_volume_db: mean,
        max_volume_db: max,
        dynamic_range_db: dynamic_range_db(astats.peak_level_db, astats.rms_level_db),
        clipping_detected: peak > CLIPPING_PEAK_DB,
    }
}

fn resolve(field: &'static str, measured: Option<f64>, default: f64) -> f64 {
    measured.unwrap_or_else(|| {
        debug!(field, default, "Measurement unavailable, using default");
        default
    })
}
