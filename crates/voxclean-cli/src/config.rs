//! CLI configuration.

use std::path::{Path, PathBuf};
use tracing::warn;

use voxclean_models::FilterChainConfig;

use crate::error::{CliError, CliResult};

/// Default input directory for `auto` mode
pub const DEFAULT_INPUT_DIR: &str = "data/fixtures";
/// Default output directory for `auto` mode
pub const DEFAULT_OUTPUT_DIR: &str = "data/output";
/// Default filter config file
pub const DEFAULT_CONFIG_FILE: &str = "config/filters.json";
/// Video containers picked up from an input directory
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov"];

/// CLI configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Input directory used by `auto` mode
    pub input_dir: PathBuf,
    /// Output directory used by `auto` mode
    pub output_dir: PathBuf,
    /// Filter config used when `--config` is not given
    pub config_file: PathBuf,
    /// Maximum concurrent clips
    pub max_jobs: usize,
    /// FFmpeg timeout per run, in seconds
    pub ffmpeg_timeout_secs: Option<u64>,
    /// Lowercase extensions, without the dot
    pub extensions: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            max_jobs: 1,
            ffmpeg_timeout_secs: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl CliConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            input_dir: lookup("VOXCLEAN_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.input_dir),
            output_dir: lookup("VOXCLEAN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            config_file: lookup("VOXCLEAN_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_file),
            max_jobs: lookup("VOXCLEAN_MAX_JOBS")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_jobs),
            ffmpeg_timeout_secs: lookup("VOXCLEAN_FFMPEG_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0),
            extensions: lookup("VOXCLEAN_EXTENSIONS")
                .map(|s| parse_extensions(&s))
                .filter(|exts| !exts.is_empty())
                .unwrap_or(defaults.extensions),
        }
    }
}

fn parse_extensions(list: &str) -> Vec<String> {
    list.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Load a filter config file.
///
/// Structural problems are reported as warnings; nodes the compiler cannot
/// render are skipped at compile time.
pub fn load_filter_config(path: &Path) -> CliResult<FilterChainConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config = FilterChainConfig::from_json_str(&text).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Err(e) = config.validate() {
        warn!(path = %path.display(), error = %e, "Filter config has problems");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::from_lookup(lookup(&[]));
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.extensions, vec!["mp4", "mkv", "mov"]);
        assert_eq!(config.config_file, PathBuf::from("config/filters.json"));
    }

    #[test]
    fn test_overrides() {
        let config = CliConfig::from_lookup(lookup(&[
            ("VOXCLEAN_INPUT_DIR", "/media/in"),
            ("VOXCLEAN_MAX_JOBS", "4"),
            ("VOXCLEAN_FFMPEG_TIMEOUT", "600"),
            ("VOXCLEAN_EXTENSIONS", ".MP4, webm"),
        ]));
        assert_eq!(config.input_dir, PathBuf::from("/media/in"));
        assert_eq!(config.max_jobs, 4);
        assert_eq!(config.ffmpeg_timeout_secs, Some(600));
        assert_eq!(config.extensions, vec!["mp4", "webm"]);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = CliConfig::from_lookup(lookup(&[
            ("VOXCLEAN_MAX_JOBS", "0"),
            ("VOXCLEAN_FFMPEG_TIMEOUT", "soon"),
            ("VOXCLEAN_EXTENSIONS", " , "),
        ]));
        assert_eq!(config.max_jobs, 1);
        assert_eq!(config.ffmpeg_timeout_secs, None);
        assert_eq!(config.extensions, vec!["mp4", "mkv", "mov"]);
    }

    #[test]
    fn test_load_filter_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        std::fs::write(
            &path,
            r#"{"audio_codec": "aac", "audio_bitrate": "128k",
                "audio_filters": [{"name": "highpass", "args": {"f": 100}}]}"#,
        )
        .unwrap();

        let config = load_filter_config(&path).unwrap();
        assert_eq!(config.audio_bitrate, "128k");
        assert_eq!(config.filter_names(), vec!["highpass"]);
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_filter_config(&dir.path().join("nope.json")),
            Err(CliError::ConfigRead { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(load_filter_config(&bad), Err(CliError::ConfigParse { .. })));
    }
}
