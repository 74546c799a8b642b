//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and cache creation
//! to reduce duplication across command handlers.

use std::sync::Arc;

use tracing::info;

use sizecache::config::ConfigFile;
use sizecache::host::{HostView, SizeComputer};
use sizecache::log::{LogLevel, TracingLogger};
use sizecache::logging::{init_logging, LoggingGuard, LoggingOptions};
use sizecache::service::{LayoutCache, LayoutCacheConfig};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps the log file writer alive while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config file (defaults if absent) and initialize logging.
    ///
    /// `debug_mode` raises the default level to debug; `RUST_LOG` still wins.
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let mut options = LoggingOptions::from(&config.logging);
        if debug_mode {
            options.level = LogLevel::Debug;
        }

        let logging_guard =
            init_logging(&options).map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("sizecache v{}", sizecache::VERSION);
        info!("sizecache CLI: {} command", command);
    }

    /// Create a layout cache over `host`.
    pub fn create_cache(
        &self,
        host: Arc<dyn HostView>,
        computer: Arc<dyn SizeComputer>,
        config: LayoutCacheConfig,
    ) -> Result<LayoutCache, CliError> {
        let cache = LayoutCache::builder()
            .host(host)
            .computer(computer)
            .logger(Arc::new(TracingLogger))
            .config(config)
            .build()?;
        info!("Layout cache created");
        Ok(cache)
    }
}
