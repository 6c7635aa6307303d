//! Filter-chain configuration: the unit exchanged between policy
//! generation, config files and the graph compiler.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::filter::FilterSpec;

/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Declarative audio processing configuration.
///
/// Filter order is execution order. An empty filter list is not processable
/// and is replaced by the fallback policy before encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FilterChainConfig {
    /// Audio codec (e.g., "aac")
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate (e.g., "192k")
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Ordered filter graph nodes
    #[serde(default, rename = "audio_filters")]
    pub filters: Vec<FilterSpec>,
}

fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for FilterChainConfig {
    fn default() -> Self {
        Self {
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            filters: Vec::new(),
        }
    }
}

impl FilterChainConfig {
    /// Create an empty configuration with the given codec and bitrate.
    pub fn new(audio_codec: impl Into<String>, audio_bitrate: impl Into<String>) -> Self {
        Self {
            audio_codec: audio_codec.into(),
            audio_bitrate: audio_bitrate.into(),
            filters: Vec::new(),
        }
    }

    /// Append a filter.
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Names of the top-level filters, in order.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name.as_str()).collect()
    }

    /// Parse from the JSON config-file shape.
    pub fn from_json_str(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON in the config-file shape.
    pub fn to_json_pretty(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every filter node.
    pub fn validate(&self) -> ModelResult<()> {
        self.filters.iter().try_for_each(FilterSpec::validate)
    }

    /// Convert to FFmpeg audio encoder arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}
