//! Unified error handling for the tarmac crate
//!
//! This module provides a unified error type that consolidates all
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors available where a caller needs their detail.
//!
//! # Architecture
//!
//! - [`TarmacErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use tarmac::error::{Error, TarmacErrorTrait};
//!
//! fn report(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Request rejected: {err}");
//!     } else {
//!         eprintln!("Fatal error ({}): {err}", err.category());
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::config::ConfigError;
pub use crate::notifications::ObserverError;
pub use crate::scheduler::error::SchedulerError;
pub use crate::service::client::ClientError;
pub use crate::service::server::ServerError;

/// Result type using the unified error
pub type Result<T> = std::result::Result<T, Error>;

/// Common trait for all tarmac error types
pub trait TarmacErrorTrait: std::error::Error {
    /// Check if this error is recoverable (state unchanged, caller may go on)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Scheduling outcomes and lock faults
    Scheduler,
    /// Observer delivery errors
    Notification,
    /// HTTP transport errors
    Network,
    /// Configuration and validation errors
    Config,
    /// File and socket I/O errors
    Io,
    /// Server-side faults
    Internal,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduler => "scheduler",
            Self::Notification => "notification",
            Self::Network => "network",
            Self::Config => "config",
            Self::Io => "io",
            Self::Internal => "internal",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for the tarmac crate
#[derive(Error, Debug)]
pub enum Error {
    /// Scheduler operation errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Observer delivery errors
    #[error("Notification error: {0}")]
    Notification(#[from] ObserverError),

    /// HTTP client errors
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TarmacErrorTrait for SchedulerError {
    fn is_recoverable(&self) -> bool {
        SchedulerError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        if self.is_internal() {
            ErrorCategory::Internal
        } else {
            ErrorCategory::Scheduler
        }
    }
}

impl TarmacErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Notification(_) => true,
            Self::Client(e) => e.is_recoverable(),
            Self::Server(_) => false,
            Self::Config(_) => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Scheduler(e) => TarmacErrorTrait::category(e),
            Self::Notification(_) => ErrorCategory::Notification,
            Self::Client(_) => ErrorCategory::Network,
            Self::Server(_) => ErrorCategory::Internal,
            Self::Config(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Io,
            Self::Json(_) | Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}
