//! End-to-end tests of the analysis and compilation pipeline.

use async_trait::async_trait;
use std::path::Path;

use voxclean_media::measure::{build_features, parse_astats, parse_volumedetect};
use voxclean_media::{
    auto_policy, build_process_command, classify, compile, fallback_policy, generate,
    parse_probe_json, resolve_policy, validate_output, MediaError, MediaResult, MeasurementSource,
    Tool,
};
use voxclean_models::{FilterChainConfig, NoiseRegime, Profile};

const PROBE_JSON: &str = r#"{
    "streams": [
        {"sample_rate": "48000", "channels": 2, "duration": "61.312000", "bit_rate": "192000"}
    ]
}"#;

/// Cafe recording: loud, flat noise bed.
const NOISY_ASTATS: &str = "\
[Parsed_astats_0 @ 0x1] Channel: 1
[Parsed_astats_0 @ 0x1] Peak level dB: -4.200000
[Parsed_astats_0 @ 0x1] RMS level dB: -9.800000
[Parsed_astats_0 @ 0x1] Channel: 2
[Parsed_astats_0 @ 0x1] Peak level dB: -4.000000
[Parsed_astats_0 @ 0x1] RMS level dB: -10.200000
[Parsed_astats_0 @ 0x1] Overall
[Parsed_astats_0 @ 0x1] Peak level dB: -4.000000
[Parsed_astats_0 @ 0x1] RMS level dB: -10.000000
";

const NOISY_VOLUMEDETECT: &str = "\
[Parsed_volumedetect_0 @ 0x2] n_samples: 5885952
[Parsed_volumedetect_0 @ 0x2] mean_volume: -11.3 dB
[Parsed_volumedetect_0 @ 0x2] max_volume: -4.0 dB
";

/// Close-mic'd voice-over in a treated room.
const QUIET_ASTATS: &str = "\
[Parsed_astats_0 @ 0x1] Peak level dB: -3.500000
[Parsed_astats_0 @ 0x1] RMS level dB: -31.000000
[Parsed_astats_0 @ 0x1] Peak level dB: -6.000000
[Parsed_astats_0 @ 0x1] RMS level dB: -29.000000
";

struct Recording {
    astats: &'static str,
    volumedetect: &'static str,
    duration: f64,
    fail_stats: bool,
}

#[async_trait]
impl MeasurementSource for Recording {
    async fn probe_stream(&self, _path: &Path) -> MediaResult<String> {
        Ok(PROBE_JSON.to_string())
    }

    async fn astats(&self, _path: &Path) -> MediaResult<String> {
        if self.fail_stats {
            return Err(MediaError::ToolNotFound(Tool::Ffmpeg));
        }
        Ok(self.astats.to_string())
    }

    async fn volumedetect(&self, _path: &Path) -> MediaResult<String> {
        Ok(self.volumedetect.to_string())
    }

    async fn peak_astats(&self, _path: &Path) -> MediaResult<String> {
        Ok("[Parsed_astats_0 @ 0x3] Peak level dB: -1.500000\n".to_string())
    }

    async fn duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(self.duration)
    }
}

fn noisy() -> Recording {
    Recording {
        astats: NOISY_ASTATS,
        volumedetect: NOISY_VOLUMEDETECT,
        duration: 61.312,
        fail_stats: false,
    }
}

#[test]
fn noisy_text_to_aggressive_graph() {
    let stream = parse_probe_json(PROBE_JSON).unwrap();
    let features = build_features(
        &stream,
        &parse_astats(NOISY_ASTATS),
        &parse_volumedetect(NOISY_VOLUMEDETECT),
    );

    assert!((features.rms_level_db - (-10.0)).abs() < 1e-9);
    assert!((features.peak_level_db - (-4.0)).abs() < 1e-9);
    assert_eq!(classify(&features), NoiseRegime::High);

    let config = generate(&features, Profile::Aggressive);
    assert_eq!(config.audio_bitrate, "256k");
    assert_eq!(
        compile(&config.filters),
        "highpass=f=120,lowpass=f=12000,afftdn=nr=20:nf=-40:tn=1,\
         acompressor=threshold=-24dB:ratio=3:attack=5:release=80:makeup=3,\
         agate=threshold=0.01:ratio=2:attack=5:release=150,\
         loudnorm=I=-16:LRA=11:TP=-1.5"
    );
}

#[test]
fn quiet_text_to_light_graph() {
    let stream = parse_probe_json(PROBE_JSON).unwrap();
    let features = build_features(&stream, &parse_astats(QUIET_ASTATS), &parse_volumedetect(""));

    assert!((features.rms_level_db - (-30.0)).abs() < 1e-9);
    assert_eq!(classify(&features), NoiseRegime::Low);

    let config = generate(&features, Profile::Light);
    assert_eq!(config.filter_names(), vec!["highpass", "acompressor", "loudnorm"]);
    assert_eq!(config.audio_bitrate, "192k");
}

#[tokio::test]
async fn auto_policy_drives_process_command() {
    let source = noisy();
    let input = Path::new("clips/cafe.mp4");
    let config = auto_policy(&source, input, Profile::Light).await;

    let resolved = resolve_policy(&config);
    let args =
        build_process_command(input, Path::new("out/cafe.mp4"), &resolved, true).build_args();
    let af = args.iter().position(|a| a == "-af").unwrap();
    assert!(args[af + 1].starts_with("highpass=f=90,lowpass=f=14000,afftdn=nr=10:nf=-50,"));
    assert!(args[af + 1].ends_with("loudnorm=I=-16:LRA=11:TP=-1.5"));
}

#[tokio::test]
async fn analysis_failure_falls_back() {
    let source = Recording {
        fail_stats: true,
        ..noisy()
    };
    let config = auto_policy(&source, Path::new("clips/cafe.mp4"), Profile::Aggressive).await;
    assert_eq!(config, fallback_policy());
}

#[tokio::test]
async fn validation_of_matching_output_passes() {
    let source = noisy();
    let report = validate_output(&source, Path::new("in.mp4"), Path::new("out.mp4")).await;
    assert!(report.ok, "{}", report);
}

#[test]
fn empty_config_file_resolves_to_fallback() {
    let config =
        FilterChainConfig::from_json_str(r#"{"audio_codec": "aac", "audio_filters": []}"#).unwrap();
    assert_eq!(compile(&config.filters), "");
    assert_eq!(resolve_policy(&config).into_owned(), fallback_policy());
}

#[test]
fn config_file_graph_round_trips_through_compiler() {
    let json = r#"{
        "audio_codec": "aac",
        "audio_bitrate": "160k",
        "audio_filters": [
            {"name": "highpass", "args": {"f": 200, "p": 2}},
            {"name": "lowpass", "args": {"f": 3500}},
            {"name": "loudnorm", "args": {"I": -16, "LRA": 11, "TP": -1.5, "dual_mono": true}}
        ]
    }"#;
    let config = FilterChainConfig::from_json_str(json).unwrap();
    let reloaded = FilterChainConfig::from_json_str(&config.to_json_pretty().unwrap()).unwrap();
    assert_eq!(
        compile(&reloaded.filters),
        "highpass=f=200:p=2,lowpass=f=3500,loudnorm=I=-16:LRA=11:TP=-1.5"
    );
    assert_eq!(reloaded.audio_bitrate, "160k");
}
