//! Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FieldMergeError, FieldMergeResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default merge parameters.
    pub merge: MergeDefaults,

    /// External deinterlace filter settings.
    pub deinterlace: DeinterlaceConfig,

    /// Preview canvas and zoom behaviour.
    pub display: DisplayConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// How decoded images are mapped onto field channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// Convert every input to 8-bit RGB.
    #[default]
    Rgb,
    /// Keep the decoded channel layout (gray, gray+alpha, RGB, RGBA).
    Native,
}

/// Default merge parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeDefaults {
    /// Initial vertical shift applied to field B rows.
    pub vertical_shift: i32,

    /// Initial horizontal rotation applied to field B rows.
    pub horizontal_shift: i32,

    /// Channel normalisation for loaded fields.
    pub channel_mode: ChannelMode,
}

/// External deinterlace filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeinterlaceConfig {
    /// Filter executable (looked up in PATH when not absolute).
    pub program: String,

    /// Video filter graph passed to the executable.
    pub filter: String,

    /// Give up on the filter after this many seconds. `None` waits forever.
    pub timeout_secs: Option<u64>,
}

/// Preview canvas and zoom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Zoom increment per wheel notch.
    pub zoom_step: f64,

    /// Lower zoom bound; there is no upper bound.
    pub min_zoom: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "fieldmerge=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for DeinterlaceConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            filter: "yadif".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600,
            canvas_height: 400,
            zoom_step: 0.1,
            min_zoom: 0.1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`], failures are errors.
    pub fn load_from(path: &Path) -> FieldMergeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FieldMergeError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FieldMergeError::config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("fieldmerge").join("config.json")
}
