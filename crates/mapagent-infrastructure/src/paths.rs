//! Unified path management for mapagent configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/mapagent/          # Config directory (platform config dir)
//! └── config.toml              # Session configuration
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "MAPAGENT_CONFIG";

const APP_DIR: &str = "mapagent";
const CONFIG_FILE: &str = "config.toml";

pub struct MapAgentPaths;

impl MapAgentPaths {
    /// Returns the mapagent configuration directory (e.g. `~/.config/mapagent/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the config file path.
    ///
    /// `MAPAGENT_CONFIG` wins when set and non-empty.
    pub fn config_file() -> Result<PathBuf, PathError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(Self::config_dir()?.join(CONFIG_FILE)),
        }
    }
}
