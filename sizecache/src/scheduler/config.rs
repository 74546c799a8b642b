//! Scheduler configuration.

use crate::config::defaults::{DEFAULT_MAX_CONCURRENT, MAX_CONCURRENT_CEILING};

/// Clamps a concurrency ceiling into `[1, MAX_CONCURRENT_CEILING]`.
///
/// Logs a warning when the requested value had to change.
pub fn clamp_max_concurrent(requested: usize) -> usize {
    let clamped = requested.clamp(1, MAX_CONCURRENT_CEILING);
    if clamped != requested {
        tracing::warn!(
            requested,
            clamped,
            "max_concurrent out of range, clamping"
        );
    }
    clamped
}

/// Scheduler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum computations started and not yet finished.
    pub max_concurrent: usize,
}

impl SchedulerConfig {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: clamp_max_concurrent(max_concurrent),
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = clamp_max_concurrent(max_concurrent);
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}
