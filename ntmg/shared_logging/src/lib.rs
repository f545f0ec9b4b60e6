#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured JSON-lines logging shared by the ntmg crates.
//!
//! Records are written through a [`LogSink`]. Two sinks ship with the crate:
//! [`JsonLogger`] appends one JSON object per line to a file, and
//! [`MemorySink`] keeps records in memory for inspection. A [`Logger`] binds a
//! sink to a module name and a minimum level.

use std::{
    fmt,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Log severity level, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational events.
    #[default]
    Info,
    /// Warning indicator.
    Warn,
    /// Error indicator.
    Error,
}

/// Structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Timestamp in ISO8601.
    pub timestamp: DateTime<Utc>,
    /// Module emitting the log.
    pub module: String,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Arbitrary JSON payload for counters and fields.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl LogRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(module: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            module: module.into(),
            level,
            message: message.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attaches metadata. Non-object values are stored under a `value` key.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        match metadata {
            serde_json::Value::Object(map) => self.metadata = map,
            serde_json::Value::Null => {}
            other => {
                self.metadata.insert("value".into(), other);
            }
        }
        self
    }
}

/// Destination for log records.
pub trait LogSink: Send + Sync {
    /// Persists a single record.
    fn write(&self, record: &LogRecord) -> Result<()>;
}

/// Append-only JSON-lines file sink.
#[derive(Debug)]
pub struct JsonLogger {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonLogger {
    /// Creates or opens a log file, creating parent directories as needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Returns the underlying file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for JsonLogger {
    fn write(&self, record: &LogRecord) -> Result<()> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory sink, mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out everything written so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Module-scoped logger that drops records below its minimum level.
#[derive(Clone)]
pub struct Logger {
    module: String,
    min_level: LogLevel,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("module", &self.module)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Binds a sink to a module name. The minimum level defaults to `Info`.
    #[must_use]
    pub fn new(module: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            module: module.into(),
            min_level: LogLevel::default(),
            sink,
        }
    }

    /// Sets the minimum level.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Module name stamped on every record.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Minimum level that reaches the sink.
    #[must_use]
    pub const fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Whether a record at `level` would be written.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Writes a record with structured metadata.
    pub fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        let record = LogRecord::new(&self.module, level, message).with_metadata(metadata);
        self.sink.write(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn writes_json_lines() {
        let dir = tempdir().unwrap();
        let logger = JsonLogger::new(dir.path().join("nested/test.log")).unwrap();
        logger
            .write(&LogRecord::new("module", LogLevel::Info, "hello"))
            .unwrap();
        logger
            .write(&LogRecord::new("module", LogLevel::Warn, "again"))
            .unwrap();
        let content = fs::read_to_string(logger.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"message\":\"hello\""));
        assert!(lines[1].contains("\"level\":\"WARN\""));
    }

    #[test]
    fn empty_metadata_is_omitted() {
        let record = LogRecord::new("m", LogLevel::Debug, "x");
        let text = serde_json::to_string(&record).unwrap();
        assert!(!text.contains("metadata"));
    }

    #[test]
    fn scalar_metadata_lands_under_value() {
        let record = LogRecord::new("m", LogLevel::Info, "x").with_metadata(json!(3));
        assert_eq!(record.metadata["value"], json!(3));
    }

    #[test]
    fn logger_filters_below_min_level() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::new("dataset", sink.clone()).with_min_level(LogLevel::Warn);
        logger.log(LogLevel::Info, "quiet", json!({})).unwrap();
        logger
            .log(LogLevel::Error, "loud", json!({ "rows": 4 }))
            .unwrap();
        let records = sink.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "loud");
        assert_eq!(records[0].module, "dataset");
        assert_eq!(records[0].metadata["rows"], json!(4));
    }

    #[test]
    fn levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }
}
