//! Runtime on/off switch for a logger.

use std::fmt::Arguments;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::log::{LogLevel, Logger};

/// Wraps a logger with a switch that can be flipped from any thread.
///
/// While disabled every message is dropped before reaching the inner
/// logger. Errors are not exempt.
pub struct GatedLogger {
    inner: Arc<dyn Logger>,
    enabled: AtomicBool,
}

impl GatedLogger {
    /// Creates an enabled gate around `inner`.
    pub fn new(inner: Arc<dyn Logger>) -> Self {
        Self::with_enabled(inner, true)
    }

    pub fn with_enabled(inner: Arc<dyn Logger>, enabled: bool) -> Self {
        Self {
            inner,
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Logger for GatedLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        if self.enabled() {
            self.inner.log(level, args);
        }
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.enabled() && self.inner.is_enabled(level)
    }
}

impl std::fmt::Debug for GatedLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatedLogger")
            .field("enabled", &self.enabled())
            .finish()
    }
}
