//! Error types for the scheduler module

use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::Category;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// No runway registered under this name
    RunwayNotFound { name: String },

    /// No open runway can serve the requested category
    NoEligibleRunway { flight_id: String, category: Category },

    /// Flight is not waiting in any queue (or belongs to another airline)
    FlightNotFound { flight_id: String, airline: String },

    /// Runway name already taken
    RunwayAlreadyExists { name: String },

    /// Flight id already queued or departed
    FlightAlreadyExists { flight_id: String },

    /// Requested state transition is a no-op
    InvalidState { name: String, reason: String },

    /// Missing or malformed input
    InvalidInput { field: String, reason: String },

    /// Lock could not be acquired within the retry budget
    LockTimeout { lock: &'static str, attempts: u32 },
}

/// Coarse classification used by transports to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidState,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::InvalidState => "invalid_state",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunwayNotFound { name } => {
                write!(f, "Runway '{}' not found", name)
            }
            Self::NoEligibleRunway { flight_id, category } => {
                write!(
                    f,
                    "No open runway of category {} or above for flight '{}'",
                    category, flight_id
                )
            }
            Self::FlightNotFound { flight_id, airline } => {
                write!(
                    f,
                    "Flight '{}' of airline '{}' is not waiting for departure",
                    flight_id, airline
                )
            }
            Self::RunwayAlreadyExists { name } => {
                write!(f, "Runway '{}' already exists", name)
            }
            Self::FlightAlreadyExists { flight_id } => {
                write!(f, "Flight '{}' is already tracked", flight_id)
            }
            Self::InvalidState { name, reason } => {
                write!(f, "Runway '{}' {}", name, reason)
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid '{}': {}", field, reason)
            }
            Self::LockTimeout { lock, attempts } => {
                write!(
                    f,
                    "Exceeded lock retries: could not acquire {} lock after {} attempts",
                    lock, attempts
                )
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create a runway not found error
    pub fn runway_not_found(name: impl Into<String>) -> Self {
        Self::RunwayNotFound { name: name.into() }
    }

    /// Create a flight not found error
    pub fn flight_not_found(flight_id: impl Into<String>, airline: impl Into<String>) -> Self {
        Self::FlightNotFound {
            flight_id: flight_id.into(),
            airline: airline.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Reject empty required fields before any lock is taken
    pub fn require(field: &str, value: &str) -> SchedulerResult<()> {
        if value.trim().is_empty() {
            return Err(Self::invalid_input(field, "must not be empty"));
        }
        Ok(())
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RunwayNotFound { .. }
            | Self::NoEligibleRunway { .. }
            | Self::FlightNotFound { .. } => ErrorKind::NotFound,
            Self::RunwayAlreadyExists { .. } | Self::FlightAlreadyExists { .. } => {
                ErrorKind::AlreadyExists
            }
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::LockTimeout { .. } => ErrorKind::Internal,
        }
    }

    /// Check if the error is recoverable
    ///
    /// Everything except lock exhaustion is a normal, reported outcome that
    /// left state unchanged.
    pub fn is_recoverable(&self) -> bool {
        !self.is_internal()
    }

    /// Check if the error is a server-side fault
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runway_not_found_error() {
        let err = SchedulerError::runway_not_found("R9");
        assert!(err.to_string().contains("R9"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_no_eligible_runway_is_not_found() {
        let err = SchedulerError::NoEligibleRunway {
            flight_id: "AR1300".to_string(),
            category: Category::B,
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("category B"));
    }

    #[test]
    fn test_is_recoverable() {
        let invalid = SchedulerError::invalid_state("R1", "is already closed");
        assert!(invalid.is_recoverable());

        let timeout = SchedulerError::LockTimeout {
            lock: "runway",
            attempts: 6,
        };
        assert!(!timeout.is_recoverable());
        assert!(timeout.is_internal());
        assert_eq!(timeout.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_require() {
        assert!(SchedulerError::require("airline", "AA").is_ok());
        let err = SchedulerError::require("airline", "  ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(ErrorKind::AlreadyExists.as_str(), "already_exists");
        assert_eq!(
            serde_json::to_string(&ErrorKind::InvalidState).unwrap(),
            "\"invalid_state\""
        );
    }
}
