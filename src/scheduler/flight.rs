//! Flight records tracked by the scheduler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;

/// One flight waiting for, or having completed, a departure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Flight code, unique among queued and departed flights
    pub id: String,

    /// Destination airport identifier
    pub destination: String,

    /// Owning airline
    pub airline: String,

    /// Minimum runway category this flight can use
    pub category: Category,

    /// Ticks observed while waiting in a queue
    pub flights_before_departure: u64,

    /// Set once, when the flight leaves its runway
    pub departed_at: Option<DateTime<Utc>>,
}

impl Flight {
    /// Create a new waiting flight
    pub fn new(
        id: impl Into<String>,
        destination: impl Into<String>,
        airline: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            destination: destination.into(),
            airline: airline.into(),
            category,
            flights_before_departure: 0,
            departed_at: None,
        }
    }

    /// Record that another flight left the runway ahead of this one
    pub fn observe_tick(&mut self) {
        self.flights_before_departure += 1;
    }

    /// Stamp the departure time
    pub fn depart(&mut self, at: DateTime<Utc>) {
        debug_assert!(self.departed_at.is_none(), "flight departed twice");
        self.departed_at = Some(at);
    }

    /// Whether the flight has left
    pub fn has_departed(&self) -> bool {
        self.departed_at.is_some()
    }

    /// Whether this flight belongs to `airline`
    pub fn is_operated_by(&self, airline: &str) -> bool {
        self.airline == airline
    }
}
