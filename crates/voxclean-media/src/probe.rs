//! FFprobe audio stream information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;

use voxclean_models::features::{DEFAULT_CHANNELS, DEFAULT_DURATION_SECS, DEFAULT_SAMPLE_RATE};

use crate::command::{check_ffprobe, create_ffprobe_command};
use crate::error::{MediaError, MediaResult};

/// Basic metadata of the first audio stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u32,
    /// Duration in seconds
    pub duration: f64,
    /// Bitrate in bits/second, when reported
    pub bit_rate: Option<u64>,
}

impl StreamInfo {
    /// Stream info assumed when probing fails entirely.
    pub fn fallback() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            duration: DEFAULT_DURATION_SECS,
            bit_rate: None,
        }
    }
}

impl Default for StreamInfo {
    fn default() -> Self {
        Self::fallback()
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    sample_rate: Option<NumberOrText>,
    channels: Option<NumberOrText>,
    duration: Option<NumberOrText>,
    bit_rate: Option<NumberOrText>,
}

/// FFprobe reports most numbers as strings, some as JSON numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumberOrText::Number(n) => *n,
            NumberOrText::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }

    fn as_positive_u32(&self) -> Option<u32> {
        self.as_f64()
            .filter(|v| *v >= 1.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32)
    }
}

/// Parse `ffprobe -show_entries stream=... -of json` output.
///
/// A missing or unparseable field takes its default; malformed JSON or an
/// empty `streams` array is an error.
pub fn parse_probe_json(json: &str) -> MediaResult<StreamInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json)?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| MediaError::NoAudioStream)?;

    Ok(StreamInfo {
        sample_rate: stream
            .sample_rate
            .as_ref()
            .and_then(NumberOrText::as_positive_u32)
            .unwrap_or(DEFAULT_SAMPLE_RATE),
        channels: stream
            .channels
            .as_ref()
            .and_then(NumberOrText::as_positive_u32)
            .unwrap_or(DEFAULT_CHANNELS),
        duration: stream
            .duration
            .as_ref()
            .and_then(NumberOrText::as_f64)
            .filter(|d| *d >= 0.0)
            .unwrap_or(DEFAULT_DURATION_SECS),
        bit_rate: stream
            .bit_rate
            .as_ref()
            .and_then(NumberOrText::as_f64)
            .filter(|b| *b > 0.0)
            .map(|b| b as u64),
    })
}

/// Run ffprobe on the first audio stream and return its raw JSON.
pub async fn probe_audio_stream_json(path: impl AsRef<Path>) -> MediaResult<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = create_ffprobe_command()
        .args([
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=sample_rate,channels,duration,bit_rate",
            "-of",
            "json",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Get container duration in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = create_ffprobe_command()
        .args([
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe duration query failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_duration_text(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the bare `format=duration` value printed by ffprobe.
fn parse_duration_text(text: &str) -> MediaResult<f64> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| MediaError::measurement(format!("unparseable duration '{}'", trimmed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_fields() {
        let json = r#"{"streams": [{
            "sample_rate": "44100", "channels": 1, "duration": "12.480000", "bit_rate": "128000"
        }]}"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 1);
        assert!((info.duration - 12.48).abs() < 1e-9);
        assert_eq!(info.bit_rate, Some(128000));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let info = parse_probe_json(r#"{"streams": [{"duration": "N/A"}]}"#).unwrap();
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.channels, 2);
        assert!((info.duration - 30.0).abs() < f64::EPSILON);
        assert_eq!(info.bit_rate, None);
    }

    #[test]
    fn test_no_audio_stream_is_error() {
        assert!(matches!(
            parse_probe_json(r#"{"streams": []}"#),
            Err(MediaError::NoAudioStream)
        ));
        assert!(parse_probe_json("{}").is_err());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(parse_probe_json("not json"), Err(MediaError::JsonParse(_))));
    }

    #[test]
    fn test_parse_duration_text() {
        assert!((parse_duration_text("10.050000\n").unwrap() - 10.05).abs() < 1e-9);
        assert!(parse_duration_text("N/A").is_err());
    }

    #[tokio::test]
    async fn test_stream_json_missing_file() {
        let result = probe_audio_stream_json("/nonexistent/clip.mp4").await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
