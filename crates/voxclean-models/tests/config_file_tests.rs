//! Filter config file shape tests.

use voxclean_models::{FilterChainConfig, FilterValue};

const BRANCHING_CONFIG: &str = r#"{
    "audio_codec": "aac",
    "audio_bitrate": "192k",
    "audio_filters": [
        {"name": "asplit", "args": {"n": 2}, "output_labels": ["speech", "music"]},
        {
            "input_label": "speech",
            "output_label": "speech_clean",
            "filters": [
                {"name": "highpass", "args": {"f": 100}},
                {"name": "volume", "args": {"volume": "3dB"}}
            ]
        },
        {
            "name": "ducking",
            "filter": "sidechaincompress",
            "inputs": ["music", "speech_clean"],
            "output_label": "music_ducked",
            "args": {"threshold": 0.015, "ratio": 10, "attack": 20, "release": 250}
        },
        {
            "name": "amix",
            "inputs": ["speech_clean", "music_ducked"],
            "output_label": "mixed",
            "args": {"inputs": 2, "weights": "1.0 0.25"}
        },
        {"name": "loudnorm", "input_label": "mixed", "args": {"I": -16, "LRA": 11, "TP": -1.5}}
    ]
}"#;

#[test]
fn branching_config_loads_with_aliases() {
    let config = FilterChainConfig::from_json_str(BRANCHING_CONFIG).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.filters.len(), 5);

    let chain = &config.filters[1];
    assert_eq!(chain.input_labels, vec!["speech"]);
    assert_eq!(chain.output_labels, vec!["speech_clean"]);
    assert_eq!(chain.filters.len(), 2);

    let duck = &config.filters[2];
    assert_eq!(duck.input_labels, vec!["music", "speech_clean"]);
    assert_eq!(duck.filter.as_deref(), Some("sidechaincompress"));
    let keys: Vec<_> = duck.args.keys().collect();
    assert_eq!(keys, vec!["threshold", "ratio", "attack", "release"]);

    let mix = &config.filters[3];
    assert_eq!(mix.args.get("weights"), Some(&FilterValue::Text("1.0 0.25".to_string())));
}

#[test]
fn saved_config_reloads_identically() {
    let config = FilterChainConfig::from_json_str(BRANCHING_CONFIG).unwrap();
    let saved = config.to_json_pretty().unwrap();
    assert!(saved.contains("\"audio_filters\""));
    assert!(saved.contains("\"input_labels\""));
    assert!(!saved.contains("\"input_label\""));

    let reloaded = FilterChainConfig::from_json_str(&saved).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn nested_labels_are_rejected() {
    let config = FilterChainConfig::from_json_str(
        r#"{"audio_filters": [
            {"input_label": "a", "filters": [{"name": "highpass", "output_label": "b"}]}
        ]}"#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}
