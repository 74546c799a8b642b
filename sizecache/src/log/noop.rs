//! Silent logger.

use std::fmt::Arguments;

use crate::log::{LogLevel, Logger};

/// A logger that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}

    fn is_enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_reports_disabled() {
        let logger: Box<dyn Logger> = Box::new(NoOpLogger);
        logger.error(format_args!("dropped"));
        assert!(!logger.is_enabled(LogLevel::Error));
    }
}
