//! TOML configuration loading shared by the quadruped crates.
//!
//! [`ConfigLoader`] reads and parses any deserializable config type.
//! [`ConfigSection`] is implemented by every TOML table of the FSM config
//! (`[shared]`, `[control]`, `[stand_up]`, ...): each table validates its
//! own bounds and reports errors prefixed with its table name.
//!
//! Section types reject unknown keys, so a misspelled limit fails the load
//! instead of silently keeping its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// One validated TOML table.
pub trait ConfigSection {
    /// Table name, used to prefix validation messages.
    const SECTION: &'static str;

    /// Check parameter bounds of this table.
    fn validate(&self) -> Result<(), String>;

    /// [`validate`](Self::validate), as a [`ConfigError`] naming the table.
    fn check(&self) -> Result<(), ConfigError> {
        self.validate()
            .map_err(|e| ConfigError::ValidationError(format!("{}: {e}", Self::SECTION)))
    }
}

/// Service identity and log verbosity (TOML `[shared]`).
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "quad-fsm-01"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Default tracing level; `RUST_LOG` and `-v` take precedence.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance identifier used in log lines.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "quad-fsm".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl ConfigSection for SharedConfig {
    const SECTION: &'static str = "shared";

    fn validate(&self) -> Result<(), String> {
        if self.service_name.trim().is_empty() {
            return Err("service_name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Loading of TOML configuration documents.
///
/// - `ConfigError::FileNotFound` if the file does not exist
/// - `ConfigError::ParseError` for unreadable files, bad syntax, wrong types
///   and unknown keys
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(format!("{}: {e}", path.display()))
            }
        })?;

        tracing::debug!("parsing configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Parse configuration from an in-memory TOML string.
    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
