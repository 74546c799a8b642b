//! Default values and limits for every setting.

use std::time::Duration;

use super::settings::*;
use crate::item::DependencyMode;
use crate::log::LogLevel;
use crate::service::LookupMode;
use crate::window::ScrollAxis;

// =============================================================================
// Scheduler
// =============================================================================

/// Default ceiling on simultaneously running computations.
pub const DEFAULT_MAX_CONCURRENT: usize = 40;

/// Upper bound for the ceiling. Matches tokio's default blocking-pool size,
/// so every started computation can get its own thread.
pub const MAX_CONCURRENT_CEILING: usize = 512;

// =============================================================================
// Window
// =============================================================================

/// Items prefetched ahead of the visible range.
pub const DEFAULT_LEADING_MARGIN: usize = 20;

/// Items kept warm behind the visible range.
pub const DEFAULT_TRAILING_MARGIN: usize = 5;

/// Largest margin accepted from a config file.
pub const MAX_MARGIN: usize = 1000;

pub const DEFAULT_SCROLL_AXIS: ScrollAxis = ScrollAxis::Vertical;

pub const DEFAULT_AUTO_PREFETCH: bool = false;

// =============================================================================
// Cache
// =============================================================================

pub const DEFAULT_DEPENDENCY_MODE: DependencyMode = DependencyMode::Width;

/// How long an offloaded lookup waits before computing inline.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 250;

/// Longest accepted offload wait.
pub const MAX_LOOKUP_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// Logging
// =============================================================================

pub const DEFAULT_LOG_ENABLED: bool = true;

pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

pub const DEFAULT_LOG_FILE: &str = "sizecache.log";

/// Default offload wait as a `Duration`.
pub fn default_lookup_timeout() -> Duration {
    Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS)
}

/// Clamps a margin to `MAX_MARGIN` and logs a warning if clamped.
pub(super) fn clamp_margin(key: &str, value: usize) -> usize {
    if value > MAX_MARGIN {
        tracing::warn!(
            key,
            requested = value,
            max = MAX_MARGIN,
            "{} above maximum, clamping to {}",
            key,
            MAX_MARGIN
        );
        MAX_MARGIN
    } else {
        value
    }
}

/// Clamps an offload wait to `[1, MAX_LOOKUP_TIMEOUT_MS]` and logs a
/// warning if clamped.
pub(super) fn clamp_lookup_timeout_ms(value: u64) -> u64 {
    let clamped = value.clamp(1, MAX_LOOKUP_TIMEOUT_MS);
    if clamped != value {
        tracing::warn!(
            requested = value,
            clamped,
            "lookup_timeout_ms out of range, clamping"
        );
    }
    clamped
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            scheduler: SchedulerSettings {
                max_concurrent: DEFAULT_MAX_CONCURRENT,
            },
            window: WindowSettings {
                leading_margin: DEFAULT_LEADING_MARGIN,
                trailing_margin: DEFAULT_TRAILING_MARGIN,
                axis: DEFAULT_SCROLL_AXIS,
                auto_prefetch: DEFAULT_AUTO_PREFETCH,
            },
            cache: CacheSettings {
                dependency_mode: DEFAULT_DEPENDENCY_MODE,
                lookup_mode: LookupMode::Inline,
                lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            },
            logging: LoggingSettings {
                enabled: DEFAULT_LOG_ENABLED,
                level: DEFAULT_LOG_LEVEL,
                file: None,
            },
        }
    }
}
