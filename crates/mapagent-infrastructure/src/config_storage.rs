//! Session config file storage.
//!
//! Reads and writes `SessionConfig` as TOML. Saves go through a temporary
//! file that is fsynced and then renamed over the target, so a crash never
//! leaves a half-written config behind.

use mapagent_core::SessionConfig;
use mapagent_core::error::{MapAgentError, Result};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use crate::paths::MapAgentPaths;

pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a storage handle for the given config file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a storage handle for the default config location.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the platform config directory is unknown.
    pub fn default_location() -> Result<Self> {
        let path = MapAgentPaths::config_file().map_err(|e| MapAgentError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(config))`: Successfully loaded and validated
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read, parse or validate the file
    pub fn load(&self) -> Result<Option<SessionConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        SessionConfig::from_toml_str(&content).map(Some)
    }

    /// Loads the config file, falling back to defaults when it is absent.
    pub fn load_or_default(&self) -> Result<SessionConfig> {
        match self.load()? {
            Some(config) => {
                tracing::debug!("[ConfigStorage] Loaded config from {}", self.path.display());
                Ok(config)
            }
            None => {
                tracing::debug!(
                    "[ConfigStorage] No config at {}, using defaults",
                    self.path.display()
                );
                Ok(SessionConfig::default())
            }
        }
    }

    /// Saves the config atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the file cannot be written.
    pub fn save(&self, config: &SessionConfig) -> Result<()> {
        config.validate()?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = config.to_toml_string()?;

        // Write to temporary file in the same directory
        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;

        // Ensure data is written to disk
        tmp_file.sync_all()?;
        drop(tmp_file);

        // Atomic rename
        fs::rename(&tmp_path, &self.path)?;

        tracing::info!("[ConfigStorage] Saved config to {}", self.path.display());
        Ok(())
    }

    /// Gets a temporary file path for atomic writes.
    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| MapAgentError::config("Config path has no file name"))?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(self.path.with_file_name(tmp_name))
    }
}
