//! Diagnostic logging for the cache core.
//!
//! Core components never call `tracing` directly. They hold an
//! `Arc<dyn Logger>` and log through the `log_*!` macros, so hosts can route,
//! silence or gate diagnostics without a global subscriber.
//!
//! - [`Logger`]: the interface
//! - [`TracingLogger`]: forwards to `tracing` under the `sizecache` target
//! - [`NoOpLogger`]: discards everything
//! - [`GatedLogger`]: runtime on/off switch around another logger
//!
//! ```
//! use sizecache::log::{GatedLogger, Logger, NoOpLogger};
//! use sizecache::log_debug;
//! use std::sync::Arc;
//!
//! let logger = Arc::new(GatedLogger::new(Arc::new(NoOpLogger)));
//! log_debug!(logger, "window moved to {}", 42);
//! logger.set_enabled(false);
//! ```

mod gate;
mod noop;
mod tracing_adapter;
mod r#trait;

pub use gate::GatedLogger;
pub use noop::NoOpLogger;
pub use r#trait::{LogLevel, Logger, ParseLogLevelError};
pub use tracing_adapter::TracingLogger;
