//! Console logging for the speed tester
//!
//! Compact structured logger used for phase lifecycle events and for
//! swallowed transfer-job errors. Levels are filtered at runtime; output
//! goes to stderr so it never interleaves with progress lines or JSON
//! results on stdout.

use crate::error::{Result, SpeedtestError};
use chrono::Utc;
use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug level - detailed information for debugging
    Debug = 0,
    /// Info level - general application information
    Info = 1,
    /// Warning level - potentially harmful situations
    Warn = 2,
    /// Error level - error events but application can continue
    Error = 3,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    /// Format the level tag with its console color
    fn colored_tag(&self) -> colored::ColoredString {
        match self {
            LogLevel::Debug => self.as_str().cyan(),
            LogLevel::Info => self.as_str().green(),
            LogLevel::Warn => self.as_str().yellow(),
            LogLevel::Error => self.as_str().red(),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = SpeedtestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(SpeedtestError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Minimum level emitted by [`log`]; defaults to `Info`
static MIN_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Set the global minimum log level
pub fn set_min_level(level: LogLevel) {
    MIN_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Get the current global minimum log level
pub fn min_level() -> LogLevel {
    LogLevel::from_u8(MIN_LEVEL.load(Ordering::Relaxed))
}

/// Emit a log line for the given component if `level` passes the filter
pub fn log(level: LogLevel, component: &str, message: &str) {
    if level < min_level() {
        return;
    }
    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
    eprintln!(
        "{} {:5} [{}] {}",
        timestamp,
        level.colored_tag(),
        component,
        message
    );
}

/// Debug-level convenience wrapper
pub fn debug(component: &str, message: &str) {
    log(LogLevel::Debug, component, message);
}

/// Info-level convenience wrapper
pub fn info(component: &str, message: &str) {
    log(LogLevel::Info, component, message);
}

/// Warn-level convenience wrapper
pub fn warn(component: &str, message: &str) {
    log(LogLevel::Warn, component, message);
}

/// Error-level convenience wrapper
pub fn error(component: &str, message: &str) {
    log(LogLevel::Error, component, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("INFO").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("Warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_min_level_round_trip() {
        let previous = min_level();
        set_min_level(LogLevel::Debug);
        assert_eq!(min_level(), LogLevel::Debug);
        set_min_level(previous);
    }

    #[test]
    fn test_level_names() {
        assert_eq!(LogLevel::Debug.as_str(), "DEBUG");
        assert_eq!(LogLevel::Error.as_str(), "ERROR");
    }
}
