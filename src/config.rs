//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\music-inventory\config.toml
//! - macOS: ~/Library/Application Support/music-inventory/config.toml
//! - Linux: ~/.config/music-inventory/config.toml
//!
//! The file only supplies defaults; CLI flags override it. The merged
//! result is frozen into an [`InventoryConfig`] that every scanner and
//! extractor receives by `Arc` and never mutates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extensions treated as media when nothing else is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".m4a", ".m4p", ".m4v", ".mp3", ".ogg", ".wav", ".wma"];

/// Extensions the tag reader is never pointed at.
pub const DEFAULT_TAG_EXEMPT: &[&str] = &[".wma"];

/// Persisted configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directories to inventory
    pub roots: Vec<PathBuf>,

    /// Extension allow-list (with or without leading dot), matched exactly
    pub extensions: Vec<String>,

    /// Extensions exempt from tag parsing, matched ignoring case
    pub tag_exempt: Vec<String>,

    /// Number of extractor workers
    pub workers: usize,

    /// Capacity of each bounded queue between stages
    pub queue_capacity: usize,

    /// Output CSV path
    pub output: PathBuf,

    /// Rows between progress log lines
    pub progress_interval: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            tag_exempt: DEFAULT_TAG_EXEMPT.iter().map(|s| s.to_string()).collect(),
            workers: 8,
            queue_capacity: 20,
            output: PathBuf::from("files.csv"),
            progress_interval: 50,
        }
    }
}

/// Immutable run configuration shared by all pipeline stages.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub roots: Vec<PathBuf>,
    pub workers: usize,
    pub queue_capacity: usize,
    pub output: PathBuf,
    pub progress_interval: usize,
    extensions: HashSet<String>,
    tag_exempt: HashSet<String>,
}

impl InventoryConfig {
    /// Validate and freeze a [`Config`].
    pub fn from_config(config: Config) -> Result<Self> {
        if config.roots.is_empty() {
            return Err(Error::config("no root directories given"));
        }
        if config.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        if config.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be at least 1"));
        }
        if config.progress_interval == 0 {
            return Err(Error::config("progress_interval must be at least 1"));
        }

        let extensions = normalize_extensions(&config.extensions, false);
        if extensions.is_empty() {
            return Err(Error::config("extension allow-list is empty"));
        }

        Ok(Self {
            roots: config.roots,
            workers: config.workers,
            queue_capacity: config.queue_capacity,
            output: config.output,
            progress_interval: config.progress_interval,
            extensions,
            tag_exempt: normalize_extensions(&config.tag_exempt, true),
        })
    }

    /// Whether a dotted extension is in the allow-list. Case matters:
    /// `.MP3` is not allowed by `.mp3`.
    pub fn is_allowed(&self, ext: &str) -> bool {
        self.extensions.contains(ext)
    }

    /// Whether tag parsing is skipped for a dotted extension.
    pub fn is_tag_exempt(&self, ext: &str) -> bool {
        self.tag_exempt.contains(&ext.to_ascii_lowercase())
    }
}

/// Ensure a leading dot, optionally lowercase; blanks are dropped.
fn normalize_extensions(exts: &[String], lowercase: bool) -> HashSet<String> {
    exts.iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty() && *e != ".")
        .map(|e| {
            let e = if lowercase { e.to_ascii_lowercase() } else { e.to_string() };
            if e.starts_with('.') { e } else { format!(".{e}") }
        })
        .collect()
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("music-inventory"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from an explicit path, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to an explicit path
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> std::result::Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
