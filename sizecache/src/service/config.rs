//! Facade configuration types.

use std::fmt;
use std::time::Duration;

use crate::config::defaults::{
    DEFAULT_AUTO_PREFETCH, DEFAULT_DEPENDENCY_MODE, DEFAULT_LOG_ENABLED,
};
use crate::item::DependencyMode;
use crate::scheduler::SchedulerConfig;
use crate::window::{ScrollAxis, WindowConfig};

/// How a cache-filling lookup computes a missing size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// Call the size computer on the calling thread.
    #[default]
    Inline,
    /// Hand the computation to the scheduler at explicit priority and wait
    /// up to `timeout`; compute inline if it does not finish in time.
    ///
    /// Lookups made from inside the runtime always compute inline, since
    /// they cannot block on it.
    Offload { timeout: Duration },
}

impl LookupMode {
    pub fn offload(timeout: Duration) -> Self {
        Self::Offload { timeout }
    }
}

impl fmt::Display for LookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Offload { timeout } => write!(f, "offload ({}ms)", timeout.as_millis()),
        }
    }
}

/// Configuration for a [`LayoutCache`](super::LayoutCache).
///
/// # Example
///
/// ```
/// use sizecache::item::DependencyMode;
/// use sizecache::service::LayoutCacheConfig;
///
/// let config = LayoutCacheConfig::default()
///     .with_max_concurrent(8)
///     .with_leading_margin(30)
///     .with_dependency_mode(DependencyMode::Size)
///     .with_auto_prefetch(true);
///
/// assert_eq!(config.scheduler.max_concurrent, 8);
/// assert_eq!(config.window.leading_margin, 30);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutCacheConfig {
    pub scheduler: SchedulerConfig,
    pub window: WindowConfig,
    /// Container axis that cached sizes depend on.
    pub dependency_mode: DependencyMode,
    /// Start with scroll-driven prefetching enabled.
    pub auto_prefetch: bool,
    /// Start with diagnostics enabled.
    pub log_enabled: bool,
    pub lookup_mode: LookupMode,
}

impl Default for LayoutCacheConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            window: WindowConfig::default(),
            dependency_mode: DEFAULT_DEPENDENCY_MODE,
            auto_prefetch: DEFAULT_AUTO_PREFETCH,
            log_enabled: DEFAULT_LOG_ENABLED,
            lookup_mode: LookupMode::default(),
        }
    }
}

impl LayoutCacheConfig {
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.scheduler = self.scheduler.with_max_concurrent(max_concurrent);
        self
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_leading_margin(mut self, margin: usize) -> Self {
        self.window = self.window.with_leading_margin(margin);
        self
    }

    pub fn with_trailing_margin(mut self, margin: usize) -> Self {
        self.window = self.window.with_trailing_margin(margin);
        self
    }

    pub fn with_axis(mut self, axis: ScrollAxis) -> Self {
        self.window = self.window.with_axis(axis);
        self
    }

    pub fn with_dependency_mode(mut self, mode: DependencyMode) -> Self {
        self.dependency_mode = mode;
        self
    }

    pub fn with_auto_prefetch(mut self, enabled: bool) -> Self {
        self.auto_prefetch = enabled;
        self
    }

    pub fn with_log_enabled(mut self, enabled: bool) -> Self {
        self.log_enabled = enabled;
        self
    }

    pub fn with_lookup_mode(mut self, mode: LookupMode) -> Self {
        self.lookup_mode = mode;
        self
    }
}
