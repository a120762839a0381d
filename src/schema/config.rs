//! Configuration types for recording and playback sessions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Pattern;

/// Frame rate used when the configuration does not give one.
fn default_frame_rate_ms() -> i32 {
    5
}

fn default_pixel_count() -> usize {
    64
}

fn default_frame_count() -> u64 {
    30
}

/// Top-level movie configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieConfig {
    /// Movie file to record to or play from.
    pub path: PathBuf,
    /// Milliseconds between frames, stored in the header.
    #[serde(default = "default_frame_rate_ms")]
    pub frame_rate_ms: i32,
    /// Pixels per frame for generated movies (3 bytes each).
    #[serde(default = "default_pixel_count")]
    pub pixel_count: usize,
    /// Number of frames for generated movies.
    #[serde(default = "default_frame_count")]
    pub frame_count: u64,
    /// Test pattern for generated movies.
    #[serde(default)]
    pub pattern: Pattern,
}

impl Default for MovieConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("movie.opcm"),
            frame_rate_ms: default_frame_rate_ms(),
            pixel_count: default_pixel_count(),
            frame_count: default_frame_count(),
            pattern: Pattern::default(),
        }
    }
}

impl MovieConfig {
    /// Load and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Byte length of one generated frame, saturating at `usize::MAX`.
    #[inline]
    pub fn frame_length(&self) -> usize {
        self.pixel_count.saturating_mul(3)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.frame_rate_ms < 0 {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate_ms));
        }
        if self.pixel_count == 0 {
            return Err(ConfigError::InvalidPixelCount);
        }
        let fits = self
            .pixel_count
            .checked_mul(3)
            .is_some_and(|len| i32::try_from(len).is_ok());
        if !fits {
            return Err(ConfigError::FrameTooLarge(self.pixel_count));
        }
        Ok(())
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Movie path must not be empty")]
    EmptyPath,
    #[error("Frame rate must not be negative (got {0} ms)")]
    InvalidFrameRate(i32),
    #[error("Pixel count must be non-zero")]
    InvalidPixelCount,
    #[error("{0} pixels do not fit in one frame")]
    FrameTooLarge(usize),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
