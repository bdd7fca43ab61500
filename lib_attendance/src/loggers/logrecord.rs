use crate::utils::current_datetime_rfc9557;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// # Log Level
///
/// Severity on the numeric scale used across `rsdev`: 0 (Silly) to 6 (Fatal).
/// Serialized as the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum LogLevel {
    /// Very fine-grained chatter.
    Silly = 0,
    /// Execution flow tracing.
    Trace = 1,
    /// Internal details for debugging.
    Debug = 2,
    /// Normal progress.
    Info = 3,
    /// Unusual but recoverable.
    Warn = 4,
    /// An operation failed.
    Error = 5,
    /// The application cannot continue.
    Fatal = 6,
}

impl LogLevel {
    /// Every level, lowest first.
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Silly,
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Levels at or above `min`.
    pub fn at_least(min: LogLevel) -> Vec<LogLevel> {
        Self::ALL.into_iter().filter(|level| *level >= min).collect()
    }

    /// Upper-case label used in TTY and file output.
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Silly => "SILLY",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<LogLevel> for i64 {
    fn from(level: LogLevel) -> Self {
        level as i64
    }
}

impl TryFrom<i64> for LogLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, String> {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| format!("log level out of range: {value}"))
    }
}

/// # Logrecord
///
/// One log entry as written to the JSON-line log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logrecord {
    /// RFC 9557 formatted timestamp string.
    pub rfc9557: String,
    /// The severity level.
    pub loglevel: LogLevel,
    /// Details about the message content.
    pub message: Message,
    /// Information about the application generating the log.
    pub app: App,
    /// Structured extras; an empty array when absent.
    pub tags: Value,
}

impl Logrecord {
    /// Builds a record stamped with the current time.
    pub fn new(app_name: &str, loglevel: LogLevel, text: &str, extras: Option<Value>) -> Self {
        Self {
            rfc9557: current_datetime_rfc9557(),
            loglevel,
            message: Message {
                text: text.to_string(),
                ..Message::default()
            },
            app: App {
                pid: i64::from(std::process::id()),
                name: app_name.to_string(),
            },
            tags: extras.unwrap_or_else(|| serde_json::json!([])),
        }
    }

    /// Whether the record carries structured extras.
    pub fn has_tags(&self) -> bool {
        self.tags != serde_json::json!([])
    }
}

/// # Message
///
/// Textual content of a log entry and its language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The language of the message (e.g., "en" for English).
    pub lang: String,
    /// The actual text content of the message.
    pub text: String,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            text: String::new(),
            lang: "en".to_string(),
        }
    }
}

/// # App
///
/// The application that produced the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct App {
    /// The process ID (PID) of the application.
    pub pid: i64,
    /// The name of the application.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_serializes_as_number() {
        assert_eq!(serde_json::to_value(LogLevel::Warn).unwrap(), serde_json::json!(4));
        let parsed: LogLevel = serde_json::from_value(serde_json::json!(6)).unwrap();
        assert_eq!(parsed, LogLevel::Fatal);
        assert!(serde_json::from_value::<LogLevel>(serde_json::json!(7)).is_err());
        assert!(serde_json::from_value::<LogLevel>(serde_json::json!(-1)).is_err());
    }

    #[test]
    fn at_least_keeps_higher_severities() {
        assert_eq!(
            LogLevel::at_least(LogLevel::Warn),
            vec![LogLevel::Warn, LogLevel::Error, LogLevel::Fatal]
        );
    }

    #[test]
    fn record_without_extras_has_empty_tags() {
        let record = Logrecord::new("attendance", LogLevel::Info, "hello", None);
        assert!(!record.has_tags());
        assert_eq!(record.message.lang, "en");
        assert_eq!(record.app.name, "attendance");

        let tagged = Logrecord::new("attendance", LogLevel::Info, "hello", Some(serde_json::json!({"k": 1})));
        assert!(tagged.has_tags());
    }
}
