//! Persisted connection settings.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_DIR_ENV: &str = "PARTDB_CONFIG_DIR";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "plugin.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the user configuration directory")]
    NoConfigDir,

    #[error("failed to create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: partdb_api::default_api_url(),
            token: String::new(),
        }
    }
}

/// `<config dir>/kicad/plugins/partdb-kicad-plugin`, or `$PARTDB_CONFIG_DIR`.
/// Created if missing.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("kicad")
            .join("plugins")
            .join("partdb-kicad-plugin"),
    };
    fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

pub fn log_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(LOG_FILE))
}

impl Config {
    /// Settings as typed into the UI; surrounding whitespace is dropped.
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            api_url: api_url.trim().to_string(),
            token: token.trim().to_string(),
        }
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        match config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                log::warn!("Using default configuration: {e}");
                Self::default()
            }
        }
    }

    /// Load from `path`. A missing, unreadable or malformed file yields the
    /// defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Self::default();
        }
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("Error reading config {}: {e}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Error loading config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save to the default location and return where it was written.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(contents.as_bytes())?;
                f.flush()
            })
            .map_err(|e| ConfigError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        log::debug!("Saved configuration to {}", path.display());
        Ok(())
    }
}
