//! Internal logging for the tracer.
//!
//! Records go to the sink installed from the tracer options when one is
//! present, otherwise they are forwarded to the [`log`] crate macros after
//! level filtering. An installed [`LogSink`] receives every record together
//! with its level and applies its own filtering.
//!
//! One-time deprecation warnings for legacy facade methods also live here;
//! the set of already-warned method names grows for the process lifetime and
//! is never cleared.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::ConfigError;

/// Severity of an internal log record.
///
/// Ordered from most to least severe, so `record <= threshold` decides
/// whether a record passes the configured level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Initialization failures and other unrecoverable conditions.
    Error,
    /// Deprecations and ignored configuration values.
    Warn,
    /// Startup records.
    Info,
    /// Span lifecycle and platform service chatter.
    Debug,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(ConfigError::UnknownLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => f.write_str("error"),
            LogLevel::Warn => f.write_str("warn"),
            LogLevel::Info => f.write_str("info"),
            LogLevel::Debug => f.write_str("debug"),
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

/// A destination for the tracer's internal log records.
pub trait LogSink: Send + Sync {
    /// Write a single record.
    fn log(&self, level: LogLevel, message: &str);
}

static SINK: Lazy<RwLock<Option<Arc<dyn LogSink>>>> = Lazy::new(|| RwLock::new(None));
static LEVEL: Lazy<RwLock<LogLevel>> = Lazy::new(|| RwLock::new(LogLevel::Error));
static WARNED: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Install a custom sink. `None` leaves the current sink in place.
pub(crate) fn use_sink(sink: Option<Arc<dyn LogSink>>) {
    if let Some(sink) = sink {
        *SINK.write().expect("log sink lock poisoned") = Some(sink);
    }
}

/// Set the level for the built-in [`log`] crate forwarding. Debug mode wins
/// over the configured level.
pub(crate) fn toggle(debug: bool, level: LogLevel) {
    let level = if debug { LogLevel::Debug } else { level };
    *LEVEL.write().expect("log level lock poisoned") = level;
}

fn current_sink() -> Option<Arc<dyn LogSink>> {
    SINK.read().expect("log sink lock poisoned").clone()
}

fn emit(level: LogLevel, message: &dyn fmt::Display) {
    match current_sink() {
        Some(sink) => sink.log(level, &message.to_string()),
        None => {
            if level <= *LEVEL.read().expect("log level lock poisoned") {
                log::log!(log::Level::from(level), "{}", message);
            }
        }
    }
}

pub(crate) fn error(message: impl fmt::Display) {
    emit(LogLevel::Error, &message);
}

pub(crate) fn warn(message: impl fmt::Display) {
    emit(LogLevel::Warn, &message);
}

pub(crate) fn info(message: impl fmt::Display) {
    emit(LogLevel::Info, &message);
}

pub(crate) fn debug(message: impl fmt::Display) {
    emit(LogLevel::Debug, &message);
}

/// Warn that a legacy facade method was called, once per method name for the
/// process lifetime. The warning skips the level filter so it is not lost
/// when debug logging is off.
pub(crate) fn deprecate(method: &'static str) {
    let mut warned = WARNED.lock().expect("deprecation set lock poisoned");
    if warned.insert(method) {
        let message = format!(
            "tracer.{method}() is deprecated. \
             Please use tracer.start_span() and tracer.scope() instead."
        );
        match current_sink() {
            Some(sink) => sink.log(LogLevel::Warn, &message),
            None => log::warn!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order_from_most_to_least_severe() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn deprecate_warns_once_per_method() {
        struct Counter(Mutex<Vec<String>>);
        impl LogSink for Counter {
            fn log(&self, _level: LogLevel, message: &str) {
                self.0.lock().unwrap().push(message.to_string());
            }
        }

        let counter = Arc::new(Counter(Mutex::new(Vec::new())));
        use_sink(Some(counter.clone()));

        deprecate("log_unit_test_method");
        deprecate("log_unit_test_method");

        let seen = counter.0.lock().unwrap();
        let hits = seen
            .iter()
            .filter(|m| m.contains("tracer.log_unit_test_method()"))
            .count();
        assert_eq!(hits, 1);
    }
}
