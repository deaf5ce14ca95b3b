//! Engine configuration
//!
//! TOML-backed configuration with full defaults, so an application runs
//! without any config file present. Every section can be overridden
//! independently.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use crate::physics::PhysicsConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Window creation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Forge Engine".to_string(),
        }
    }
}

/// Where to find compiled SPIR-V shader binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub shader_dir: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            shader_dir: "shaders/spv".to_string(),
        }
    }
}

impl ShaderConfig {
    /// Resolve a shader binary by name, trying the configured directory
    /// and a few common fallbacks relative to the working directory.
    pub fn shader_path(&self, name: &str) -> PathBuf {
        let candidates = [
            PathBuf::from(&self.shader_dir).join(name),
            PathBuf::from("shaders/spv").join(name),
            PathBuf::from("../shaders/spv").join(name),
        ];

        for candidate in &candidates {
            if candidate.exists() {
                return candidate.clone();
            }
        }

        // Fall back to the configured location; loading will report the
        // missing file with its full path.
        PathBuf::from(&self.shader_dir).join(name)
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub shaders: ShaderConfig,
    pub physics: PhysicsConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration, falling back to defaults when the file is
    /// missing or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                config
            }
            Err(ConfigError::Io(_)) => {
                log::info!("No configuration at {:?}, using defaults", path);
                Self::default()
            }
            Err(error) => {
                log::warn!("Invalid configuration at {:?} ({}), using defaults", path, error);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sensible() {
        let config = EngineConfig::default();

        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert!(config.physics.gravity > 0.0, "Y-down world: gravity is positive");
        assert!(config.physics.restitution > 0.0 && config.physics.restitution <= 1.0);
    }

    #[test]
    fn test_partial_toml_overrides_one_section() {
        let toml = r#"
            [physics]
            gravity = 3.7
            restitution = 0.5
        "#;

        let config: EngineConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.physics.gravity, 3.7);
        assert_eq!(config.physics.restitution, 0.5);
        // Untouched sections keep their defaults
        assert_eq!(config.window.width, 800);
        assert_eq!(config.physics.velocity_damping, 0.99);
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let mut config = EngineConfig::default();
        config.window.title = "Playground".to_string();
        config.physics.ground_y = 2.5;

        let serialized = toml::to_string(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.window.title, "Playground");
        assert_eq!(parsed.physics.ground_y, 2.5);
    }
}
