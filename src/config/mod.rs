//! Configuration management for tarmac
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Every section has defaults, so a file only needs
//! the values it changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::notifications::NotifierConfig;
use crate::scheduler::LockPolicy;
use crate::service::ServerConfig;

/// Prefix of every environment variable read by [`Config::from_env`]
pub const ENV_PREFIX: &str = "TARMAC_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP service configuration
    pub server: ServerConfig,

    /// Lock acquisition limits
    pub scheduler: SchedulerConfig,

    /// Observer delivery limits
    pub notifications: NotifierConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Scheduler lock configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Timed attempts per lock acquisition
    pub lock_attempts: u32,

    /// Length of each attempt in milliseconds
    pub lock_attempt_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let policy = LockPolicy::default();
        Self {
            lock_attempts: policy.attempts,
            lock_attempt_timeout_ms: policy.attempt_timeout.as_millis() as u64,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from `TARMAC_*` environment variables
    ///
    /// Unset variables keep their defaults; set but unparsable ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source using the env var names
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let config = Self {
            server: ServerConfig {
                bind_address: parse_or(var("BIND_ADDRESS"), "BIND_ADDRESS", defaults.server.bind_address)?,
                enable_cors: parse_or(var("ENABLE_CORS"), "ENABLE_CORS", defaults.server.enable_cors)?,
                enable_request_logging: parse_or(
                    var("ENABLE_REQUEST_LOGGING"),
                    "ENABLE_REQUEST_LOGGING",
                    defaults.server.enable_request_logging,
                )?,
            },
            scheduler: SchedulerConfig {
                lock_attempts: parse_or(
                    var("LOCK_ATTEMPTS"),
                    "LOCK_ATTEMPTS",
                    defaults.scheduler.lock_attempts,
                )?,
                lock_attempt_timeout_ms: parse_or(
                    var("LOCK_ATTEMPT_TIMEOUT_MS"),
                    "LOCK_ATTEMPT_TIMEOUT_MS",
                    defaults.scheduler.lock_attempt_timeout_ms,
                )?,
            },
            notifications: NotifierConfig {
                max_concurrent_deliveries: parse_or(
                    var("MAX_CONCURRENT_DELIVERIES"),
                    "MAX_CONCURRENT_DELIVERIES",
                    defaults.notifications.max_concurrent_deliveries,
                )?,
                delivery_timeout_ms: parse_or(
                    var("DELIVERY_TIMEOUT_MS"),
                    "DELIVERY_TIMEOUT_MS",
                    defaults.notifications.delivery_timeout_ms,
                )?,
            },
            logging: LoggingConfig {
                level: var("LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: var("LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        };

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.lock_attempts == 0 {
            return Err(ConfigError::invalid("scheduler.lock_attempts", "must be greater than 0"));
        }

        if self.scheduler.lock_attempt_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "scheduler.lock_attempt_timeout_ms",
                "must be greater than 0",
            ));
        }

        if self.notifications.max_concurrent_deliveries == 0 {
            return Err(ConfigError::invalid(
                "notifications.max_concurrent_deliveries",
                "must be greater than 0",
            ));
        }

        if self.notifications.delivery_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "notifications.delivery_timeout_ms",
                "must be greater than 0",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::invalid(
                "logging.format",
                format!("expected one of {}", LOG_FORMATS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Lock policy for the scheduler
    #[must_use]
    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy::new(
            self.scheduler.lock_attempts,
            Duration::from_millis(self.scheduler.lock_attempt_timeout_ms),
        )
    }
}

fn parse_or<T: FromStr>(value: Option<String>, name: &str, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::invalid(format!("{ENV_PREFIX}{name}"), format!("cannot parse '{raw}'"))
        }),
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
