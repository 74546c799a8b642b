//! Settings structs, one per `[section]` of the config file.

use std::path::PathBuf;

use crate::item::DependencyMode;
use crate::log::LogLevel;
use crate::service::LookupMode;
use crate::window::ScrollAxis;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub scheduler: SchedulerSettings,
    pub window: WindowSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

/// `[scheduler]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Ceiling on simultaneously running computations (1-512).
    pub max_concurrent: usize,
}

/// `[window]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSettings {
    pub leading_margin: usize,
    pub trailing_margin: usize,
    pub axis: ScrollAxis,
    /// Start with scroll-driven prefetching enabled.
    pub auto_prefetch: bool,
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub dependency_mode: DependencyMode,
    /// How a filling lookup computes a miss. The offload wait comes from
    /// `lookup_timeout_ms`.
    pub lookup_mode: LookupMode,
    pub lookup_timeout_ms: u64,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Initial state of the cache's diagnostic switch.
    pub enabled: bool,
    /// Default filter when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Optional log file. Empty means stdout only.
    pub file: Option<PathBuf>,
}
