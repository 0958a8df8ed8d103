//! Rig editor configuration
//!
//! Uses RON (Rusty Object Notation) like the scene files. Every field has a
//! default, so a config file only needs the values it wants to change.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// Error type for config loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    ValidationError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::SerializeError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            ConfigError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Starting camera placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, -6.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 45.0,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

/// Tunables for the editor controls and timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Radians per drag event when orbiting or turning the camera
    pub rotation_speed: f32,
    /// Distance step for zoom drags and translate keys
    pub zoom_speed: f32,
    /// Radians per roll key press
    pub roll_speed: f32,
    /// Height of the timeline panel below the 3D viewport, in pixels
    pub timeline_panel_height: f32,
    /// Timeline scale used when scrubbing the playhead
    pub px_per_second: f32,
    /// Length of the timeline track in seconds
    pub track_length: f32,
    pub camera: CameraConfig,
    /// Directory that scene assets are resolved against
    pub scenes_dir: PathBuf,
    /// Scene assets bound to the number keys, in order (1, 2, 3, ...)
    pub scenes: Vec<String>,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 0.05,
            zoom_speed: 0.1,
            roll_speed: 0.1,
            timeline_panel_height: 200.0,
            px_per_second: 68.0,
            track_length: 10.0,
            camera: CameraConfig::default(),
            scenes_dir: PathBuf::from("assets/scenes"),
            scenes: default_scenes(),
        }
    }
}

/// Scene names listed by the build script, one per line
fn default_scenes() -> Vec<String> {
    include_str!(concat!(env!("OUT_DIR"), "/scene_manifest.txt"))
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl RigConfig {
    /// Parse a config from RON text
    pub fn load_from_str(s: &str) -> Result<Self, ConfigError> {
        let config: RigConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::load_from_str(&contents)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Write this config as pretty RON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the controls can't work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("rotation_speed", self.rotation_speed),
            ("zoom_speed", self.zoom_speed),
            ("roll_speed", self.roll_speed),
            ("px_per_second", self.px_per_second),
            ("track_length", self.track_length),
            ("camera.fov_degrees", self.camera.fov_degrees),
            ("camera.z_near", self.camera.z_near),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be positive, got {}", name, value
                )));
            }
        }
        if !self.timeline_panel_height.is_finite() || self.timeline_panel_height < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "timeline_panel_height must not be negative, got {}", self.timeline_panel_height
            )));
        }
        if self.camera.z_far <= self.camera.z_near {
            return Err(ConfigError::ValidationError(format!(
                "camera.z_far ({}) must be beyond camera.z_near ({})",
                self.camera.z_far, self.camera.z_near
            )));
        }
        if self.camera.fov_degrees >= 180.0 {
            return Err(ConfigError::ValidationError(format!(
                "camera.fov_degrees must be below 180, got {}", self.camera.fov_degrees
            )));
        }
        Ok(())
    }

    /// Scene asset bound to a number key slot (0-based)
    pub fn scene_for_slot(&self, slot: usize) -> Option<&str> {
        self.scenes.get(slot).map(String::as_str)
    }
}
