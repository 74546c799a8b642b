//! INI serialization: `ConfigFile` -> commented config text.

use std::path::Path;

use super::settings::ConfigFile;
use crate::service::LookupMode;

/// Renders `config` as the commented INI written to config.ini.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let lookup = match config.cache.lookup_mode {
        LookupMode::Inline => "inline",
        LookupMode::Offload { .. } => "offload",
    };
    let log_file = config
        .logging
        .file
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    format!(
        r#"[scheduler]
; Maximum size computations running at once (default: 40, clamped to 1-512)
max_concurrent = {}

[window]
; Items prefetched ahead of the visible range, in the scroll direction (default: 20)
leading_margin = {}
; Items kept warm behind the visible range (default: 5)
trailing_margin = {}
; Offset axis that decides the scroll direction: vertical or horizontal
axis = {}
; Start with scroll-driven prefetching enabled (default: false)
auto_prefetch = {}

[cache]
; Container axis item sizes depend on:
;   width  - vertical lists (height computed for the container width)
;   height - horizontal lists
;   size   - both axes
dependency_mode = {}
; How a lookup computes a missing size:
;   inline  - on the calling thread
;   offload - on a worker, waiting up to lookup_timeout_ms
lookup = {}
lookup_timeout_ms = {}

[logging]
; Emit cache diagnostics (default: true)
enabled = {}
; Default level when RUST_LOG is unset: trace, debug, info, warn, error
level = {}
; Optional log file; empty logs to stdout only
file = {}
"#,
        config.scheduler.max_concurrent,
        config.window.leading_margin,
        config.window.trailing_margin,
        config.window.axis,
        config.window.auto_prefetch,
        config.cache.dependency_mode,
        lookup,
        config.cache.lookup_timeout_ms,
        config.logging.enabled,
        config.logging.level,
        log_file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
