//! Structured JSON logger
//!
//! - One log line = one event, JSON encoded
//! - Deterministic key ordering (event, level, then fields alphabetically)
//! - Synchronous, no buffering
//! - Always written to stderr; stdout carries reports
//! - Lines below the process-wide minimum level are dropped

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-check detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Ignored input, degraded analysis
    Warn = 2,
    /// Run failures
    Error = 3,
}

impl LogLevel {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

/// A structured logger that outputs JSON lines on stderr
pub struct Logger;

impl Logger {
    /// Set the minimum level that is written
    pub fn set_min_level(level: LogLevel) {
        MIN_LEVEL.store(level as u8, Ordering::Relaxed);
    }

    /// Current minimum level
    pub fn min_level() -> LogLevel {
        LogLevel::from_u8(MIN_LEVEL.load(Ordering::Relaxed))
    }

    /// Log an event with the given level and fields
    ///
    /// Fields are output in deterministic order (alphabetical by key)
    pub fn log(level: LogLevel, event: &str, fields: &[(&str, &str)]) {
        if level < Self::min_level() {
            return;
        }
        Self::log_to_writer(level, event, fields, &mut io::stderr());
    }

    fn log_to_writer<W: Write>(
        level: LogLevel,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let mut output = String::with_capacity(256);

        output.push('{');

        output.push_str("\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push('"');

        output.push_str(",\"level\":\"");
        output.push_str(level.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');

        // One write per line
        let _ = writer.write_all(output.as_bytes());
        let _ = writer.flush();
    }

    /// Escape special characters for JSON strings
    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Error, event, fields);
    }
}

/// Capture logs to a buffer for testing
#[cfg(test)]
pub fn capture_log(level: LogLevel, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(level, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
