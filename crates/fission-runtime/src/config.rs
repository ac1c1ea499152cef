//! Plant configuration.
//!
//! A [`PlantConfig`] is a plain serde struct that serializes to TOML.
//! Configuration is layered: compile-time defaults, then an optional
//! file, then programmatic overrides, merged with
//! [`merge`](PlantConfig::merge) (a field overrides only when it
//! differs from the default, so layers compose without clobbering).

use fission_types::ErrorCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Runtime configuration.
///
/// # Example
///
/// ```
/// use fission_runtime::config::{LogLevel, PlantConfig};
///
/// let config = PlantConfig {
///     threads: 4,
///     log_level: LogLevel::Debug,
///     ..PlantConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Worker thread count. Must be positive; the default is derived
    /// from hardware parallelism.
    pub threads: usize,

    /// Default log level for the plant's tracing output.
    pub log_level: LogLevel,

    /// Capacity of the diagnostics journal ring.
    pub journal_capacity: usize,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            log_level: LogLevel::Info,
            journal_capacity: 256,
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(2, usize::from)
}

impl PlantConfig {
    /// Creates a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the invariants the runtime relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `threads` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Invalid(
                "threads must be a positive integer".into(),
            ));
        }
        Ok(())
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid config TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_toml(&text)
    }

    /// Parses a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serializes to a pretty TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when serialization fails (which
    /// would indicate a bug in the config types themselves).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Merges `other` into `self`, layering style: a field of `other`
    /// overrides only when it differs from the compile-time default.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.threads != default.threads {
            self.threads = other.threads;
        }
        if other.log_level != default.log_level {
            self.log_level = other.log_level;
        }
        if other.journal_capacity != default.journal_capacity {
            self.journal_capacity = other.journal_capacity;
        }
    }
}

/// Log verbosity, lowest to highest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The equivalent `tracing` filter directive.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// Configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Read(String),

    /// The config text could not be parsed (or serialized).
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A field value violates a runtime invariant.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Read(_) => "CONFIG_READ_FAILED",
            Self::Parse(_) => "CONFIG_PARSE_FAILED",
            Self::Invalid(_) => "CONFIG_INVALID",
        }
    }

    fn is_recoverable(&self) -> bool {
        // All three are fixable by the operator, not by retrying.
        false
    }
}
