//! # Engine Configuration
//!
//! All tunables for the window, camera, frame timing, asset locations, debug
//! behaviour and player controls. Every section uses `#[serde(default)]` so a
//! config file only needs to name the values it changes.
//!
//! ```toml
//! [window]
//! width = 1920
//! height = 1080
//!
//! [camera]
//! fov_degrees = 80.0
//! ```

use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};

pub use crate::config::{Config, ConfigError};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window creation settings
    pub window: WindowConfig,
    /// Projection settings for the player camera
    pub camera: CameraConfig,
    /// Frame timing
    pub timing: TimingConfig,
    /// Asset locations
    pub assets: AssetConfig,
    /// Development behaviour
    pub debug: DebugConfig,
    /// Player controls
    pub controls: ControlsConfig,
}

impl Config for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()?;
        self.timing.validate()
    }
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
    /// Whether to wait for vertical sync
    pub vsync: bool,
    /// Capture the mouse for look controls at startup
    pub relative_mouse: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Panorama".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            relative_mouse: true,
        }
    }
}

/// Camera projection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl CameraConfig {
    /// Check that the values describe a usable perspective projection
    ///
    /// Requires `near > 0`, `far > near` and a field of view strictly between
    /// 0 and 180 degrees.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.near.is_finite() && self.near > 0.0) {
            return Err(ConfigError::Invalid {
                field: "camera.near",
                reason: format!("{} is not a positive distance", self.near),
            });
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return Err(ConfigError::Invalid {
                field: "camera.far",
                reason: format!("{} is not beyond near ({})", self.far, self.near),
            });
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid {
                field: "camera.fov_degrees",
                reason: format!("{} is outside (0, 180)", self.fov_degrees),
            });
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Frame timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound on the per-frame delta in seconds
    pub max_delta_seconds: f32,
}

impl TimingConfig {
    /// The delta clamp must be a non-negative number of seconds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_delta_seconds.is_finite() && self.max_delta_seconds >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::Invalid {
                field: "timing.max_delta_seconds",
                reason: format!("{} is not a non-negative duration", self.max_delta_seconds),
            })
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_delta_seconds: 0.05,
        }
    }
}

/// Asset location configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory every relative asset path is resolved against
    pub base_path: PathBuf,
    /// Shader directory, relative to `base_path`
    pub shader_dir: PathBuf,
}

impl AssetConfig {
    /// Full path of the shader directory
    pub fn shader_root(&self) -> PathBuf {
        self.base_path.join(&self.shader_dir)
    }

    /// Resolve a path relative to the base path (absolute paths pass through)
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            shader_dir: PathBuf::from("shaders"),
        }
    }
}

/// Development configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Watch the shader directory and rebuild changed shaders each frame
    pub hot_reload: bool,
    /// Pause the simulation instead of carrying on when a frame fails
    pub pause_on_error: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            hot_reload: cfg!(debug_assertions),
            pause_on_error: cfg!(debug_assertions),
        }
    }
}

/// Player control configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Walking speed in units per second
    pub move_speed: f32,
    /// Radians of rotation per pixel of mouse motion
    pub mouse_sensitivity: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            mouse_sensitivity: 0.0025,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.timing.max_delta_seconds, 0.05);
        assert_eq!(config.assets.shader_root(), PathBuf::from("./shaders"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = "[window]\nwidth = 1920\n\n[camera]\nfov_degrees = 90.0\n";
        let config = EngineConfig::parse(Path::new("engine.toml"), text).unwrap();
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.camera.fov_degrees, 90.0);
        assert_eq!(config.camera.near, 0.1);
    }

    #[test]
    fn test_ron_parse() {
        let text = "(timing: (max_delta_seconds: 0.1), controls: (move_speed: 5.0))";
        let config = EngineConfig::parse(Path::new("engine.ron"), text).unwrap();
        assert_eq!(config.timing.max_delta_seconds, 0.1);
        assert_eq!(config.controls.move_speed, 5.0);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = EngineConfig::parse(Path::new("engine.json"), "{}").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_near_equal_to_far_rejected() {
        let text = "[camera]\nnear = 1.0\nfar = 1.0\n";
        let err = EngineConfig::parse(Path::new("engine.toml"), text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "camera.far", .. }));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let cases = [
            ("[camera]\nnear = 0.0\n", "camera.near"),
            ("[camera]\nnear = -1.0\n", "camera.near"),
            ("[camera]\nfov_degrees = 0.0\n", "camera.fov_degrees"),
            ("[camera]\nfov_degrees = 180.0\n", "camera.fov_degrees"),
            ("[timing]\nmax_delta_seconds = -0.1\n", "timing.max_delta_seconds"),
        ];
        for (text, expected) in cases {
            match EngineConfig::parse(Path::new("engine.toml"), text) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{text}"),
                other => panic!("{text} gave {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        std::fs::write(&path, "(camera: (near: 10.0, far: 5.0))").unwrap();
        assert!(matches!(
            EngineConfig::load_from_file(&path),
            Err(ConfigError::Invalid { field: "camera.far", .. })
        ));
    }

    #[test]
    fn test_zero_delta_clamp_allowed() {
        let text = "[timing]\nmax_delta_seconds = 0.0\n";
        assert!(EngineConfig::parse(Path::new("engine.toml"), text).is_ok());
    }

    #[test]
    fn test_save_and_reload_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");

        let mut config = EngineConfig::default();
        config.window.title = "Gallery".to_string();
        config.debug.hot_reload = false;
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
