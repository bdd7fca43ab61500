//! # Loggers
//!
//! Logging is an injected capability: components take an `Arc<dyn LogSink>`
//! and never touch process-wide logging state.

use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// Defines the data structures for log records.
pub mod logrecord;
/// Implements a local logger with support for TTY and file output.
pub mod loggerlocal;

use logrecord::LogLevel;

/// Destination for structured log entries.
pub trait LogSink: Send + Sync {
    /// Records `message` at `level` with optional structured `extras`.
    fn log(&self, level: LogLevel, message: &str, extras: Option<Value>);

    /// Logs at [`LogLevel::Debug`].
    fn debug(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Debug, message, extras);
    }

    /// Logs at [`LogLevel::Info`].
    fn info(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Info, message, extras);
    }

    /// Logs at [`LogLevel::Warn`].
    fn warn(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Warn, message, extras);
    }

    /// Logs at [`LogLevel::Error`].
    fn error(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Error, message, extras);
    }
}

/// A captured log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedLog {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
    /// Structured extras, if any.
    pub extras: Option<Value>,
}

/// Keeps entries in memory. Handy for tests and for callers that want to
/// inspect what a lookup did.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<CapturedLog>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<CapturedLog> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Entries logged at exactly `level`.
    pub fn at(&self, level: LogLevel) -> Vec<CapturedLog> {
        self.entries().into_iter().filter(|entry| entry.level == level).collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str, extras: Option<Value>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedLog {
                level,
                message: message.to_string(),
                extras,
            });
    }
}
