//! INI parsing: `Ini` -> `ConfigFile`.
//!
//! The single place where INI key names map to settings fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::defaults::{clamp_lookup_timeout_ms, clamp_margin};
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::scheduler::clamp_max_concurrent;
use crate::service::LookupMode;

/// Parses an `Ini` into a `ConfigFile`, starting from defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [scheduler] section
    if let Some(section) = ini.section(Some("scheduler")) {
        if let Some(v) = parse::<usize>(section, "scheduler", "max_concurrent", "must be a positive integer")? {
            config.scheduler.max_concurrent = clamp_max_concurrent(v);
        }
    }

    // [window] section
    if let Some(section) = ini.section(Some("window")) {
        if let Some(v) = parse::<usize>(section, "window", "leading_margin", "must be a non-negative integer")? {
            config.window.leading_margin = clamp_margin("leading_margin", v);
        }
        if let Some(v) = parse::<usize>(section, "window", "trailing_margin", "must be a non-negative integer")? {
            config.window.trailing_margin = clamp_margin("trailing_margin", v);
        }
        if let Some(v) = parse(section, "window", "axis", "must be 'vertical' or 'horizontal'")? {
            config.window.axis = v;
        }
        if let Some(v) = parse_bool(section, "window", "auto_prefetch")? {
            config.window.auto_prefetch = v;
        }
    }

    // [cache] section
    let mut offload = false;
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = parse(section, "cache", "dependency_mode", "must be one of: width, height, size")? {
            config.cache.dependency_mode = v;
        }
        if let Some(v) = parse::<u64>(section, "cache", "lookup_timeout_ms", "must be a positive integer (milliseconds)")? {
            config.cache.lookup_timeout_ms = clamp_lookup_timeout_ms(v);
        }
        if let Some(v) = section.get("lookup") {
            offload = match v.trim().to_lowercase().as_str() {
                "inline" => false,
                "offload" => true,
                _ => {
                    return Err(invalid("cache", "lookup", v, "must be 'inline' or 'offload'"));
                }
            };
        }
    }
    config.cache.lookup_mode = if offload {
        LookupMode::Offload {
            timeout: Duration::from_millis(config.cache.lookup_timeout_ms),
        }
    } else {
        LookupMode::Inline
    };

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = parse_bool(section, "logging", "enabled")? {
            config.logging.enabled = v;
        }
        if let Some(v) = parse(section, "logging", "level", "must be one of: trace, debug, info, warn, error")? {
            config.logging.level = v;
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            config.logging.file = (!v.is_empty()).then(|| expand_tilde(v));
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses `key` with `FromStr`. Absent or blank values yield `None`.
fn parse<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match section.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| invalid(section_name, key, v, reason)),
    }
}

fn parse_bool(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<bool>, ConfigFileError> {
    match section.get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => match v.as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(invalid(section_name, key, &v, "must be true or false")),
        },
    }
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::{MAX_CONCURRENT_CEILING, MAX_MARGIN};
    use crate::item::DependencyMode;
    use crate::log::LogLevel;
    use crate::window::ScrollAxis;

    fn parse_str(content: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(content).unwrap())
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse_str("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_parses_all_sections() {
        let config = parse_str(
            "[scheduler]\nmax_concurrent = 16\n\
             [window]\nleading_margin = 10\ntrailing_margin = 3\naxis = horizontal\nauto_prefetch = yes\n\
             [cache]\ndependency_mode = height\nlookup = offload\nlookup_timeout_ms = 80\n\
             [logging]\nenabled = false\nlevel = debug\nfile = /tmp/sizecache.log\n",
        )
        .unwrap();

        assert_eq!(config.scheduler.max_concurrent, 16);
        assert_eq!(config.window.leading_margin, 10);
        assert_eq!(config.window.trailing_margin, 3);
        assert_eq!(config.window.axis, ScrollAxis::Horizontal);
        assert!(config.window.auto_prefetch);
        assert_eq!(config.cache.dependency_mode, DependencyMode::Height);
        assert_eq!(
            config.cache.lookup_mode,
            LookupMode::Offload {
                timeout: Duration::from_millis(80)
            }
        );
        assert!(!config.logging.enabled);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/sizecache.log")));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = parse_str(
            "[scheduler]\nmax_concurrent = 0\n[window]\nleading_margin = 999999\n",
        )
        .unwrap();
        assert_eq!(config.scheduler.max_concurrent, 1);
        assert_eq!(config.window.leading_margin, MAX_MARGIN);

        let config = parse_str("[scheduler]\nmax_concurrent = 100000\n").unwrap();
        assert_eq!(config.scheduler.max_concurrent, MAX_CONCURRENT_CEILING);
    }

    #[test]
    fn test_invalid_value_names_section_and_key() {
        let err = parse_str("[cache]\ndependency_mode = diagonal\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, value, .. } => {
                assert_eq!(section, "cache");
                assert_eq!(key, "dependency_mode");
                assert_eq!(value, "diagonal");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_bool_and_number() {
        assert!(parse_str("[window]\nauto_prefetch = maybe\n").is_err());
        assert!(parse_str("[scheduler]\nmax_concurrent = lots\n").is_err());
        assert!(parse_str("[cache]\nlookup = remote\n").is_err());
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse_str("[window]\nleading_margin =\n[logging]\nfile =\n").unwrap();
        assert_eq!(config.window.leading_margin, 20);
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/var/log/x"), PathBuf::from("/var/log/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs"), home.join("logs"));
        }
    }
}
