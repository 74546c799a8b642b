//! Subscriber setup for binaries embedding the cache.
//!
//! The library itself only emits through `tracing`; nothing here runs unless
//! a binary calls [`init_logging`]. Output goes to stdout and, optionally, to
//! a log file that is truncated at startup. `RUST_LOG` overrides the
//! configured level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::defaults::DEFAULT_LOG_LEVEL;
use crate::config::LoggingSettings;
use crate::log::LogLevel;

/// Keeps the file writer alive. Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Filter used when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Log file; `None` logs to stdout only.
    pub file: Option<PathBuf>,
    pub stdout: bool,
    pub ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            file: None,
            stdout: true,
            ansi: true,
        }
    }
}

impl From<&LoggingSettings> for LoggingOptions {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level,
            file: settings.file.clone(),
            ..Self::default()
        }
    }
}

/// Installs the global subscriber.
///
/// Creates the log file's directory and clears any previous log. Fails if a
/// global subscriber is already installed.
pub fn init_logging(options: &LoggingOptions) -> io::Result<LoggingGuard> {
    let (file_layer, file_guard) = match &options.file {
        Some(path) => {
            let (directory, file_name) = prepare_log_file(path)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = options.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(options.ansi)
            .with_target(false)
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Creates the parent directory and truncates the file. Returns the
/// directory and file name for the appender.
fn prepare_log_file(path: &Path) -> io::Result<(PathBuf, PathBuf)> {
    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    fs::create_dir_all(&directory)?;
    fs::write(directory.join(&file_name), "")?;
    Ok((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_creates_directory_and_clears_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("sizecache.log");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "old log data").unwrap();

        let (directory, file_name) = prepare_log_file(&path).unwrap();

        assert_eq!(directory, temp_dir.path().join("logs"));
        assert_eq!(file_name, PathBuf::from("sizecache.log"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_prepare_rejects_path_without_file_name() {
        assert!(prepare_log_file(Path::new("/")).is_err());
    }

    #[test]
    fn test_options_from_settings() {
        let settings = LoggingSettings {
            enabled: true,
            level: LogLevel::Debug,
            file: Some(PathBuf::from("/tmp/x.log")),
        };
        let options = LoggingOptions::from(&settings);
        assert_eq!(options.level, LogLevel::Debug);
        assert_eq!(options.file, Some(PathBuf::from("/tmp/x.log")));
        assert!(options.stdout);
    }
}
