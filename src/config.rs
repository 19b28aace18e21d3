//! Generator configuration, loaded from an optional JSON file.
//!
//! Every field has a default, so `{}` is a valid config file and a missing
//! file simply means [`Config::default`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::voice::AudioConfig;

/// Cloud Text-to-Speech v1 REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL; `/text:synthesize` is appended.
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Longest request payload (SSML markup or plain text), in characters.
    pub max_input_chars: usize,
    /// Characters kept when plain text is over `max_input_chars`.
    pub truncate_to: usize,
    /// Appended after truncation.
    pub continuation_marker: String,
    pub audio: AudioConfig,
    /// Prefix for generated file names.
    pub file_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 60,
            max_input_chars: 5000,
            truncate_to: 4950,
            continuation_marker: "... and the story continues.".to_string(),
            audio: AudioConfig::default(),
            file_prefix: "StoryCode_".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Cannot read config: {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// [`Config::load`] when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
