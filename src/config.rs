//! Configuration file support.
//!
//! Folders, debounce delays, class vocabularies and log verbosity are read
//! from a JSON file in the user's config directory. A missing or broken file
//! means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTOSAVE_DELAY_MS, DEFAULT_SESSION_SAVE_DELAY_MS, SESSION_STATE_FILENAME,
};
use crate::model::{DEFAULT_CLASS_OPTIONS, DEFAULT_DETAILED_CLASS_OPTIONS, Vocabulary};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Folder scanned for frame images
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Folder scanned for per-frame annotation files
    #[serde(default = "default_json_dir")]
    pub json_dir: PathBuf,

    /// Where the last viewed frame and box are remembered
    #[serde(default = "default_session_state_path")]
    pub session_state_path: PathBuf,

    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,

    #[serde(default = "default_session_save_delay_ms")]
    pub session_save_delay_ms: u64,

    /// Allowed values for an annotation's `class`
    #[serde(default = "default_class_options")]
    pub class_options: Vec<String>,

    /// Allowed values for an annotation's `class_detailed`
    #[serde(default = "default_detailed_class_options")]
    pub detailed_class_options: Vec<String>,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("sample_frames")
}

fn default_json_dir() -> PathBuf {
    PathBuf::from("sample_jsons")
}

fn default_session_state_path() -> PathBuf {
    PathBuf::from(SESSION_STATE_FILENAME)
}

fn default_autosave_delay_ms() -> u64 {
    DEFAULT_AUTOSAVE_DELAY_MS
}

fn default_session_save_delay_ms() -> u64 {
    DEFAULT_SESSION_SAVE_DELAY_MS
}

fn default_class_options() -> Vec<String> {
    DEFAULT_CLASS_OPTIONS.iter().map(|s| s.to_string()).collect()
}

fn default_detailed_class_options() -> Vec<String> {
    DEFAULT_DETAILED_CLASS_OPTIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            image_dir: default_image_dir(),
            json_dir: default_json_dir(),
            session_state_path: default_session_state_path(),
            autosave_delay_ms: default_autosave_delay_ms(),
            session_save_delay_ms: default_session_save_delay_ms(),
            class_options: default_class_options(),
            detailed_class_options: default_detailed_class_options(),
            log_level: LogLevel::default(),
        }
    }

    pub fn class_vocabulary(&self) -> Vocabulary {
        Vocabulary::new(&self.class_options)
    }

    pub fn detailed_class_vocabulary(&self) -> Vocabulary {
        Vocabulary::new(&self.detailed_class_options)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("bbox-annotator").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("bbox-annotator")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                Some(config)
            }
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
