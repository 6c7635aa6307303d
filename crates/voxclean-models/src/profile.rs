//! Processing profile definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Caller-selected processing aggressiveness, independent of the measured regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Gentle cleanup, keeps the most of the original tone
    #[default]
    Light,
    /// Stronger denoise, tighter band and compression, downward expander
    Aggressive,
    /// Broadcast voice chain: mono fold-down, presence EQ, safety limiter
    Studio,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Light => "light",
            Profile::Aggressive => "aggressive",
            Profile::Studio => "studio",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Profile::Light),
            "aggressive" => Ok(Profile::Aggressive),
            "studio" | "hq" => Ok(Profile::Studio),
            _ => Err(ModelError::UnknownProfile(s.to_string())),
        }
    }
}
