//! Configuration system
//!
//! Settings structs implement [`Config`] to gain file loading and saving,
//! with the on-disk format chosen by file extension (`.toml` or `.ron`).

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match extension(path) {
            Some("toml") => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Load configuration, falling back to defaults when the file is absent
    fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Engine settings, normally loaded from a TOML file next to the game binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Window settings
    pub window: WindowSettings,

    /// Renderer settings
    pub renderer: RendererSettings,

    /// Logging settings
    pub logging: LoggingSettings,

    /// Scene settings
    pub scene: SceneSettings,
}

/// Window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Window title
    pub title: String,

    /// Window width in screen coordinates
    pub width: u32,

    /// Window height in screen coordinates
    pub height: u32,
}

/// Renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Prefer a vsync-locked present mode
    pub vsync: bool,

    /// Directory holding the compiled SPIR-V shaders
    pub shader_dir: std::path::PathBuf,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log filter used when `RUST_LOG` is not set, e.g. "info" or
    /// "ember_engine=debug"
    pub filter: String,
}

/// Scene settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Scene file loaded at startup
    pub path: std::path::PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            renderer: RendererSettings::default(),
            logging: LoggingSettings::default(),
            scene: SceneSettings::default(),
        }
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            path: std::path::PathBuf::from("scene.ron"),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "ember".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            shader_dir: std::path::PathBuf::from("shaders"),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config for EngineSettings {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_settings_round_trip_through_toml() {
        let path = temp_path("ember_engine_settings_roundtrip.toml");
        let mut settings = EngineSettings::default();
        settings.window.title = "caldera".to_string();
        settings.window.width = 1920;
        settings.renderer.vsync = false;

        settings.save_to_file(&path).unwrap();
        let loaded = EngineSettings::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.window.title, "caldera");
        assert_eq!(loaded.window.width, 1920);
        assert!(!loaded.renderer.vsync);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = temp_path("ember_engine_settings_missing.toml");
        let _ = std::fs::remove_file(&path);

        let settings = EngineSettings::load_or_default(&path).unwrap();
        assert_eq!(settings.window.width, 1280);
        assert!(settings.renderer.vsync);
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let path = temp_path("ember_engine_settings_partial.toml");
        std::fs::write(&path, "[window]\ntitle = \"island\"\n").unwrap();

        let settings = EngineSettings::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(settings.window.title, "island");
        assert_eq!(settings.window.height, 720);
        assert_eq!(settings.logging.filter, "info");
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let path = temp_path("ember_engine_settings.yaml");
        std::fs::write(&path, "window: {}").unwrap();

        let result = EngineSettings::load_from_file(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
