//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! voices = 8
//! allow_stealing = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduler::MAX_VOICES;

/// Errors from loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}")]
    ReadFile {
        /// Path of the file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    /// The voice count is outside `1..=MAX_VOICES`.
    #[error("voice count {0} out of range (1..={MAX_VOICES})")]
    VoiceCount(usize),

    /// The voice limit exceeds the voice count.
    #[error("voice limit {limit} exceeds voice count {voices}")]
    VoiceLimit {
        /// Configured limit.
        limit: usize,
        /// Configured voice count.
        voices: usize,
    },
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolyConfig {
    /// Number of voice slots, `1..=MAX_VOICES`.
    pub voices: usize,
    /// Initial allocation throttle, `1..=voices`. `None` means the full
    /// slot table is available.
    pub voice_limit: Option<usize>,
    /// Whether a full table steals the oldest voice.
    pub allow_stealing: bool,
}

impl Default for PolyConfig {
    fn default() -> Self {
        Self {
            voices: MAX_VOICES,
            voice_limit: None,
            allow_stealing: true,
        }
    }
}

impl PolyConfig {
    /// Loads and validates a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.voices == 0 || self.voices > MAX_VOICES {
            return Err(ConfigError::VoiceCount(self.voices));
        }
        if let Some(limit) = self.voice_limit
            && limit > self.voices
        {
            return Err(ConfigError::VoiceLimit {
                limit,
                voices: self.voices,
            });
        }
        Ok(())
    }
}
