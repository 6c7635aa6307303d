//! Measured audio features and noise regime definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Sample rate assumed when the stream probe fails
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
/// Channel count assumed when the stream probe fails
pub const DEFAULT_CHANNELS: u32 = 2;
/// Duration (seconds) assumed when the stream probe fails
pub const DEFAULT_DURATION_SECS: f64 = 30.0;

/// RMS level used when no window reported one
pub const DEFAULT_RMS_LEVEL_DB: f64 = -30.0;
/// Peak level used when no window reported one
pub const DEFAULT_PEAK_LEVEL_DB: f64 = -3.0;
/// Mean volume used when the summary line is missing
pub const DEFAULT_MEAN_VOLUME_DB: f64 = -20.0;
/// Max volume used when the summary line is missing
pub const DEFAULT_MAX_VOLUME_DB: f64 = 0.0;
/// Dynamic range used when peak or RMS was not measured
pub const DEFAULT_DYNAMIC_RANGE_DB: f64 = 20.0;

/// Peak level above which the input is flagged as clipped.
pub const CLIPPING_PEAK_DB: f64 = -0.1;

/// Loudness and noise features of one input clip.
///
/// Built once per clip from probe output and diagnostic text; fields that
/// could not be measured carry their documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioFeatures {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u32,
    /// Duration in seconds
    pub duration: f64,
    /// Mean of all windowed RMS levels (dB)
    pub rms_level_db: f64,
    /// Maximum of all windowed peak levels (dB)
    pub peak_level_db: f64,
    /// Summary mean volume (dB)
    pub mean_volume_db: f64,
    /// Summary max volume (dB)
    pub max_volume_db: f64,
    /// Distance between peak and RMS (dB)
    pub dynamic_range_db: f64,
    /// Whether the input peak is at or near full scale
    pub clipping_detected: bool,
}

impl Default for AudioFeatures {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            duration: DEFAULT_DURATION_SECS,
            rms_level_db: DEFAULT_RMS_LEVEL_DB,
            peak_level_db: DEFAULT_PEAK_LEVEL_DB,
            mean_volume_db: DEFAULT_MEAN_VOLUME_DB,
            max_volume_db: DEFAULT_MAX_VOLUME_DB,
            dynamic_range_db: DEFAULT_DYNAMIC_RANGE_DB,
            clipping_detected: false,
        }
    }
}

/// Background-noise severity of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoiseRegime {
    /// Clean recording
    Low,
    /// Moderate background noise
    Medium,
    /// Loud music/noise bed with little dynamics
    High,
}

impl NoiseRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseRegime::Low => "low",
            NoiseRegime::Medium => "medium",
            NoiseRegime::High => "high",
        }
    }
}

impl fmt::Display for NoiseRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseRegime {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(NoiseRegime::Low),
            "medium" => Ok(NoiseRegime::Medium),
            "high" => Ok(NoiseRegime::High),
            _ => Err(ModelError::UnknownRegime(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_features_use_fallbacks() {
        let features = AudioFeatures::default();
        assert_eq!(features.sample_rate, 48_000);
        assert_eq!(features.channels, 2);
        assert!((features.duration - 30.0).abs() < f64::EPSILON);
        assert!((features.dynamic_range_db - 20.0).abs() < f64::EPSILON);
        assert!(!features.clipping_detected);
    }

    #[test]
    fn test_regime_round_trip_through_str() {
        for regime in [NoiseRegime::Low, NoiseRegime::Medium, NoiseRegime::High] {
            assert_eq!(regime.to_string().parse::<NoiseRegime>().unwrap(), regime);
        }
        assert!("HIGH".parse::<NoiseRegime>().is_ok());
        assert!("loud".parse::<NoiseRegime>().is_err());
    }

    #[test]
    fn test_regime_serializes_snake_case() {
        let json = serde_json::to_string(&NoiseRegime::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
