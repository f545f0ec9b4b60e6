use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogSink, Logger};

/// Builder for dataset telemetry sinks.
pub struct DatasetTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    sink: Option<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl DatasetTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            sink: None,
            min_level: LogLevel::default(),
        }
    }

    /// Writes JSON lines to `path`.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Writes to a caller-provided sink; takes precedence over `log_path`.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Drops records below `level`.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Builds the telemetry handle, opening the log file if one was set.
    pub fn build(self) -> Result<DatasetTelemetry> {
        let sink: Option<Arc<dyn LogSink>> = match (self.sink, self.log_path) {
            (Some(sink), _) => Some(sink),
            (None, Some(path)) => Some(Arc::new(JsonLogger::new(path)?)),
            (None, None) => None,
        };
        Ok(DatasetTelemetry {
            logger: sink.map(|sink| Logger::new(self.module, sink).with_min_level(self.min_level)),
        })
    }
}

/// Telemetry handle carried by datasets; cloning shares the sink.
#[derive(Clone, Default)]
pub struct DatasetTelemetry {
    logger: Option<Logger>,
}

impl fmt::Debug for DatasetTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetTelemetry")
            .field("module", &self.logger.as_ref().map(Logger::module))
            .finish()
    }
}

impl DatasetTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> DatasetTelemetryBuilder {
        DatasetTelemetryBuilder::new(module)
    }

    /// Whether records go anywhere.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.logger.is_some()
    }

    /// Logs structured metadata.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.logger {
            logger.log(level, message, metadata)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_logging::MemorySink;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_log_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("dataset.log");
        let telemetry = DatasetTelemetry::builder("dataset")
            .log_path(&path)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "dataset.select", json!({ "rows": 3 }))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("dataset.select"));
        assert!(content.contains("\"rows\":3"));
    }

    #[test]
    fn sink_respects_min_level() {
        let sink = Arc::new(MemorySink::new());
        let telemetry = DatasetTelemetry::builder("dataset")
            .sink(sink.clone())
            .min_level(LogLevel::Warn)
            .build()
            .unwrap();
        telemetry.log(LogLevel::Info, "skipped", json!({})).unwrap();
        telemetry.log(LogLevel::Warn, "kept", json!({})).unwrap();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn default_handle_is_silent() {
        let telemetry = DatasetTelemetry::default();
        assert!(!telemetry.is_enabled());
        telemetry.log(LogLevel::Error, "nowhere", Value::Null).unwrap();
    }
}
