//! Configuration file support.
//!
//! `~/.sizecache/config.ini` holds defaults for every knob a
//! [`LayoutCache`](crate::service::LayoutCache) exposes, grouped by concern:
//!
//! ```ini
//! [scheduler]
//! max_concurrent = 40
//!
//! [window]
//! leading_margin = 20
//! trailing_margin = 5
//! axis = vertical
//! auto_prefetch = false
//!
//! [cache]
//! dependency_mode = width
//! lookup = inline
//! lookup_timeout_ms = 250
//!
//! [logging]
//! enabled = true
//! level = info
//! file =
//! ```
//!
//! Missing files, sections and keys fall back to the constants in
//! [`defaults`]. Out-of-range numbers are clamped with a warning; values
//! that cannot be parsed are reported as [`ConfigFileError::InvalidValue`].

pub mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, LoggingSettings, SchedulerSettings, WindowSettings};
