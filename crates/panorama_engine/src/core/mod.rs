//! # Core Engine Module
//!
//! Shared configuration types used by every subsystem.

pub mod config;

// Re-export commonly used config types
pub use config::{
    AssetConfig,
    CameraConfig,
    Config,
    ConfigError,
    ControlsConfig,
    DebugConfig,
    EngineConfig,
    TimingConfig,
    WindowConfig,
};
