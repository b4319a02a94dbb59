//! Flight tracking notifications
//!
//! Observers subscribe to one flight and receive its lifecycle events
//! asynchronously. The scheduler never calls an observer directly: it pushes
//! events onto the observer's lane while its locks are held, and the
//! [`Notifier`] delivers them later under a bounded number of concurrent
//! deliveries.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐  push (non-blocking)  ┌──────────────────────┐
//! │   RunwayScheduler  │ ────────────────────▶ │  ObserverLane (FIFO) │
//! │ (holds its locks)  │                       └──────────┬───────────┘
//! └────────────────────┘                                  │ drain task
//!                                                         ▼
//!                                   ┌──────────────────────────────────┐
//!                                   │ Notifier: semaphore + timeout    │
//!                                   │ failures logged, never escalated │
//!                                   └──────────────────┬───────────────┘
//!                                                      ▼
//!                                            dyn FlightObserver
//! ```
//!
//! # Event order
//!
//! Each observer sees its own events in commit order. A flight's lane is
//! closed after [`FlightEvent::TrackingEnded`], which is always the last
//! event an observer receives.

pub mod dispatcher;
pub mod observer;
pub mod observers;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-exports
pub use dispatcher::{Notifier, NotifierConfig, NotifierStats, ObserverLane};
pub use observer::{FlightObserver, ObserverError, ObserverResult};
pub use observers::{EventStreamObserver, LoggingObserver};
pub use registry::CallbackRegistry;

/// Lifecycle event of a tracked flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlightEvent {
    /// Flight joined a runway queue (also sent to late subscribers)
    Assigned {
        flight_id: String,
        destination: String,
        runway: String,
        flights_ahead: usize,
    },

    /// A flight ahead departed and this one moved up
    PositionUpdated {
        flight_id: String,
        destination: String,
        runway: String,
        flights_ahead: usize,
    },

    /// Flight left its runway
    Departed {
        flight_id: String,
        destination: String,
        runway: String,
    },

    /// No further events will follow
    TrackingEnded { flight_id: String },
}

impl FlightEvent {
    /// Flight the event refers to
    pub fn flight_id(&self) -> &str {
        match self {
            Self::Assigned { flight_id, .. }
            | Self::PositionUpdated { flight_id, .. }
            | Self::Departed { flight_id, .. }
            | Self::TrackingEnded { flight_id } => flight_id,
        }
    }

    /// Get string representation of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned { .. } => "assigned",
            Self::PositionUpdated { .. } => "position_updated",
            Self::Departed { .. } => "departed",
            Self::TrackingEnded { .. } => "tracking_ended",
        }
    }

    /// Whether this is the last event of a flight
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TrackingEnded { .. })
    }

    /// Human-readable line for tracking output
    pub fn describe(&self) -> String {
        match self {
            Self::Assigned {
                flight_id,
                destination,
                runway,
                flights_ahead,
            } => format!(
                "Flight {flight_id} with destiny {destination} was assigned to runway {runway} and there are {flights_ahead} flights waiting ahead."
            ),
            Self::PositionUpdated {
                flight_id,
                destination,
                runway,
                flights_ahead,
            } => format!(
                "A flight departed from runway {runway}. Flight {flight_id} with destiny {destination} has {flights_ahead} flights waiting ahead."
            ),
            Self::Departed {
                flight_id,
                destination,
                runway,
            } => format!("Flight {flight_id} with destiny {destination} departed on runway {runway}."),
            Self::TrackingEnded { flight_id } => {
                format!("Tracking of flight {flight_id} ended.")
            }
        }
    }
}

impl fmt::Display for FlightEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
