//! Configuration file handling.
//!
//! Loads configuration from `~/.config/pose-relay/config.toml` or a custom
//! path. Every key is optional; missing keys take the built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::camera::{CameraSettings, Resolution};
use crate::tracker::TrackerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub detector: DetectorSection,
    #[serde(default, rename = "loop")]
    pub scheduler: LoopSection,
    #[serde(default)]
    pub frame: FrameSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    /// Path to the pose model weights.
    pub model: PathBuf,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            model: PathBuf::from("movenet.onnx"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoopSection {
    /// Detection loop cadence in ticks per second.
    pub tick_hz: u32,
}

impl Default for LoopSection {
    fn default() -> Self {
        Self { tick_hz: 30 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FrameSection {
    /// JPEG quality for frame payloads (1-100).
    pub jpeg_quality: u8,
}

impl Default for FrameSection {
    fn default() -> Self {
        Self { jpeg_quality: 75 }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pose-relay").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::parse_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; the file must exist.
    pub fn load_from_explicit(path: PathBuf) -> Result<Self, ConfigError> {
        Self::parse_file(&path)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Capture settings requested when acquiring a stream.
    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device_index: 0,
            resolution: Resolution {
                width: self.camera.width,
                height: self.camera.height,
            },
            fps: self.camera.fps,
        }
    }

    /// Orchestrator tuning.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            tick_hz: self.scheduler.tick_hz,
            jpeg_quality: self.frame.jpeg_quality,
            ..TrackerConfig::default()
        }
    }
}
