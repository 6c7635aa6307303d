//! Clip analysis: measure, classify, pick a policy.

use std::path::Path;
use tracing::{debug, info, warn};

use voxclean_models::{AudioFeatures, FilterChainConfig, Profile};

use crate::classify::classify;
use crate::error::MediaResult;
use crate::measure::{build_features, parse_astats, parse_volumedetect};
use crate::metrics::{self, fallback_reason};
use crate::policy::{fallback_policy, generate_for_regime};
use crate::probe::{parse_probe_json, StreamInfo};
use crate::source::MeasurementSource;

/// Measure a clip's loudness features.
///
/// A failed stream probe is logged and replaced by [`StreamInfo::fallback`].
/// Errors from the statistics runs propagate.
pub async fn analyze_audio(
    source: &dyn MeasurementSource,
    path: &Path,
) -> MediaResult<AudioFeatures> {
    let stream = match probe_stream(source, path).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Stream probe failed, using default stream info"
            );
            StreamInfo::fallback()
        }
    };

    let astats = parse_astats(&source.astats(path).await?);
    let volume = parse_volumedetect(&source.volumedetect(path).await?);

    let features = build_features(&stream, &astats, &volume);
    debug!(
        path = %path.display(),
        rms_level_db = features.rms_level_db,
        peak_level_db = features.peak_level_db,
        mean_volume_db = features.mean_volume_db,
        dynamic_range_db = features.dynamic_range_db,
        clipping = features.clipping_detected,
        "Measured audio features"
    );

    Ok(features)
}

async fn probe_stream(source: &dyn MeasurementSource, path: &Path) -> MediaResult<StreamInfo> {
    let json = source.probe_stream(path).await?;
    parse_probe_json(&json)
}

/// Analyse a clip and generate its cleanup policy.
///
/// Never fails: an analysis error yields the fallback policy.
pub async fn auto_policy(
    source: &dyn MeasurementSource,
    path: &Path,
    profile: Profile,
) -> FilterChainConfig {
    match analyze_audio(source, path).await {
        Ok(features) => {
            let regime = classify(&features);
            metrics::record_noise_regime(regime.as_str());
            info!(
                path = %path.display(),
                regime = %regime,
                profile = %profile,
                clipping = features.clipping_detected,
                "Classified noise regime"
            );
            generate_for_regime(regime, profile)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Analysis failed, using fallback policy");
            metrics::record_fallback_policy(fallback_reason::ANALYSIS_FAILED);
            fallback_policy()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::{Reply, Script, ScriptedSource};
    use voxclean_models::NoiseRegime;

    const PROBE: &str =
        r#"{"streams": [{"sample_rate": "44100", "channels": 1, "duration": "9.5"}]}"#;

    fn noisy() -> Script {
        Script {
            probe: Reply::Value(PROBE.to_string()),
            astats: Reply::Value(
                concat!(
                    "RMS level dB: -10.0\nRMS level dB: -10.0\n",
                    "Peak level dB: -5.0\nPeak level dB: -6.0\n",
                )
                .to_string(),
            ),
            volumedetect: Reply::Value("mean_volume: -10.0 dB\nmax_volume: -5.0 dB\n".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_analyze_noisy_clip() {
        let source = ScriptedSource::new().with("a.mp4", noisy());
        let features = analyze_audio(&source, Path::new("a.mp4")).await.unwrap();
        assert_eq!(features.sample_rate, 44100);
        assert_eq!(features.channels, 1);
        assert!((features.dynamic_range_db - 5.0).abs() < 1e-9);
        assert_eq!(classify(&features), NoiseRegime::High);
    }

    #[tokio::test]
    async fn test_stream_query_failure_uses_stream_defaults() {
        let script = Script {
            probe: Reply::Fail("no such stream"),
            ..noisy()
        };
        let source = ScriptedSource::new().with("a.mp4", script);
        let features = analyze_audio(&source, Path::new("a.mp4")).await.unwrap();
        assert_eq!(features.sample_rate, 48000);
        assert_eq!(features.channels, 2);
        assert_eq!(features.duration, 30.0);
        assert!((features.rms_level_db - (-10.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_garbled_stream_json_uses_stream_defaults() {
        let script = Script {
            probe: Reply::Value("not json".to_string()),
            ..noisy()
        };
        let source = ScriptedSource::new().with("a.mp4", script);
        let features = analyze_audio(&source, Path::new("a.mp4")).await.unwrap();
        assert_eq!(features.sample_rate, 48000);
    }

    #[tokio::test]
    async fn test_stats_failure_is_error() {
        let script = Script {
            volumedetect: Reply::Fail("decoder crashed"),
            ..noisy()
        };
        let source = ScriptedSource::new().with("a.mp4", script);
        assert!(analyze_audio(&source, Path::new("a.mp4")).await.is_err());
    }

    #[tokio::test]
    async fn test_auto_policy_follows_regime() {
        let source = ScriptedSource::new().with("a.mp4", noisy());
        let config = auto_policy(&source, Path::new("a.mp4"), Profile::Aggressive).await;
        assert_eq!(config, generate_for_regime(NoiseRegime::High, Profile::Aggressive));
    }

    #[tokio::test]
    async fn test_auto_policy_falls_back_on_error() {
        let source = ScriptedSource::new();
        let config = auto_policy(&source, Path::new("missing.mp4"), Profile::Light).await;
        assert_eq!(config, fallback_policy());
    }

    #[tokio::test]
    async fn test_empty_diagnostics_classify_low() {
        let script = Script {
            probe: Reply::Value(PROBE.to_string()),
            ..Default::default()
        };
        let source = ScriptedSource::new().with("a.mp4", script);
        let config = auto_policy(&source, Path::new("a.mp4"), Profile::Light).await;
        assert_eq!(config, generate_for_regime(NoiseRegime::Low, Profile::Light));
    }
}
