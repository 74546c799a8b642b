//! `tracing` backend.

use std::fmt::Arguments;

use crate::log::{LogLevel, Logger};

/// Forwards messages to `tracing` under the `sizecache` target.
///
/// Output depends on whatever subscriber the host installed; see
/// [`crate::logging::init_logging`] for the one the CLI uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "sizecache", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "sizecache", "{}", args),
            LogLevel::Info => tracing::info!(target: "sizecache", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "sizecache", "{}", args),
            LogLevel::Error => tracing::error!(target: "sizecache", "{}", args),
        }
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(target: "sizecache", tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(target: "sizecache", tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(target: "sizecache", tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(target: "sizecache", tracing::Level::WARN),
            LogLevel::Error => tracing::enabled!(target: "sizecache", tracing::Level::ERROR),
        }
    }
}
