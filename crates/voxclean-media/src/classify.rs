//! Noise regime classification.

use voxclean_models::{AudioFeatures, NoiseRegime};

/// RMS above which a flat, loud clip counts as a noise bed
pub const HIGH_MIN_RMS_DB: f64 = -12.0;
/// Dynamic range below which a loud clip counts as a noise bed
pub const HIGH_MAX_DYNAMIC_RANGE_DB: f64 = 8.0;
/// Mean volume above which a loud clip counts as a noise bed
pub const HIGH_MIN_MEAN_VOLUME_DB: f64 = -14.0;
/// RMS above which a clip has noticeable background noise
pub const MEDIUM_MIN_RMS_DB: f64 = -22.0;
/// Dynamic range below which a clip has noticeable background noise
pub const MEDIUM_MAX_DYNAMIC_RANGE_DB: f64 = 18.0;

/// Classify a clip's background-noise severity.
pub fn classify(features: &AudioFeatures) -> NoiseRegime {
    classify_levels(
        features.rms_level_db,
        features.dynamic_range_db,
        features.mean_volume_db,
    )
}

/// Classify from the three levels that drive the decision.
///
/// Rules are checked in order and the first match wins; all comparisons
/// are strict.
pub fn classify_levels(
    rms_level_db: f64,
    dynamic_range_db: f64,
    mean_volume_db: f64,
) -> NoiseRegime {
    if rms_level_db > HIGH_MIN_RMS_DB
        && dynamic_range_db < HIGH_MAX_DYNAMIC_RANGE_DB
        && mean_volume_db > HIGH_MIN_MEAN_VOLUME_DB
    {
        NoiseRegime::High
    } else if rms_level_db > MEDIUM_MIN_RMS_DB && dynamic_range_db < MEDIUM_MAX_DYNAMIC_RANGE_DB {
        NoiseRegime::Medium
    } else {
        NoiseRegime::Low
    }
}
