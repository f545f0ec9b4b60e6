//! JSON configuration for dataset transforms and telemetry.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use shared_logging::LogLevel;

use crate::{
    error::ConfigError,
    normalise::NormaliseOptions,
    split::SplitOptions,
    standardise::StandardiseOptions,
    telemetry::DatasetTelemetry,
};

/// Logging section of [`DatasetConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Module name stamped on every record.
    pub module: String,
    /// JSON-lines log file; logging is off when unset.
    pub log_path: Option<PathBuf>,
    /// Minimum level written.
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            module: "dataset".into(),
            log_path: None,
            level: LogLevel::Info,
        }
    }
}

/// Top-level configuration; every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Min-max normalisation.
    pub normalise: NormaliseOptions,
    /// Reference-based standardisation.
    pub standardise: StandardiseOptions,
    /// Train/test splitting.
    pub split: SplitOptions,
    /// Telemetry.
    pub logging: LoggingConfig,
}

impl DatasetConfig {
    /// Parses and validates JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Rejects values no operation could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.split
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("split: {err}")))?;
        if self.standardise.reference.is_empty() {
            return Err(ConfigError::Invalid(
                "standardise.reference must name a leaf".into(),
            ));
        }
        if self.standardise.feature_keys.is_empty() {
            return Err(ConfigError::Invalid(
                "standardise.feature_keys must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Builds the telemetry handle described by the logging section.
    pub fn telemetry(&self) -> anyhow::Result<DatasetTelemetry> {
        let mut builder =
            DatasetTelemetry::builder(&self.logging.module).min_level(self.logging.level);
        if let Some(path) = &self.logging.log_path {
            builder = builder.log_path(path);
        }
        builder.build()
    }
}
