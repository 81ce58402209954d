//! Configuration system.
//!
//! Loads application configuration from JSON strings/files. Every field has a
//! default, so partial files work.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::render::GlVersion;

/// Root configuration for an application instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Initial window width in pixels.
    pub width: u32,
    /// Initial window height in pixels.
    pub height: u32,
    /// Requested graphics context version.
    pub gl_version: GlVersion,
    /// Frame pacing target. 0 disables pacing.
    pub target_fps: u32,
    /// Upper bound for a single frame's delta time, in seconds.
    pub max_delta: f32,
    pub camera: CameraConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "skyfx".to_string(),
            width: 800,
            height: 600,
            gl_version: GlVersion::default(),
            target_fps: 60,
            max_delta: 0.5,
            camera: CameraConfig::default(),
        }
    }
}

/// Camera projection defaults and controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub near: f32,
    pub far: f32,
    /// Field of view in radians, see [`crate::math::Mat4::perspective`].
    pub fov: f32,
    /// Free-fly translation speed in units per second.
    pub translation_speed: f32,
    /// Radians per pixel of mouse drag per second.
    pub rotation_speed: f32,
    /// Drag velocity retained per 1/60 s after the button is released.
    pub drag_decay: f32,
    /// Pitch is clamped to `[-pitch_limit, pitch_limit]`.
    pub pitch_limit: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 1000.0,
            fov: 0.5,
            translation_speed: 30.0,
            rotation_speed: 0.5,
            drag_decay: 0.98,
            pitch_limit: 1.55,
        }
    }
}

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl AppConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
