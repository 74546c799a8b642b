//! Loading and saving `~/.sizecache/config.ini`.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::scheduler::SchedulerConfig;
use crate::service::LayoutCacheConfig;
use crate::window::WindowConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Loads from the default path. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Loads from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parses config text directly.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content)
            .map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        super::parser::parse_ini(&ini)
    }

    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Writes a commented config file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = self.to_config_string();
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Renders the commented INI text `save_to` writes.
    pub fn to_config_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Writes defaults to `path` unless a file is already there.
    ///
    /// Returns true if a file was created.
    pub fn ensure_exists_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    /// Facade configuration described by this file.
    pub fn to_layout_config(&self) -> LayoutCacheConfig {
        LayoutCacheConfig {
            scheduler: SchedulerConfig::new(self.scheduler.max_concurrent),
            window: WindowConfig {
                leading_margin: self.window.leading_margin,
                trailing_margin: self.window.trailing_margin,
                axis: self.window.axis,
            },
            dependency_mode: self.cache.dependency_mode,
            auto_prefetch: self.window.auto_prefetch,
            log_enabled: self.logging.enabled,
            lookup_mode: self.cache.lookup_mode,
        }
    }
}

/// `~/.sizecache`, or `./.sizecache` when there is no home directory.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sizecache")
}

/// `~/.sizecache/config.ini`
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
