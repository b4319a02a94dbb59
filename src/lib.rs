//! tarmac - Airport runway scheduler
//!
//! Assigns departing flights to runways, issues departures, and streams each
//! flight's progress to the parties tracking it.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`scheduler`] - Runway table, best-fit assignment, departures and queries
//! - [`notifications`] - Flight observers and per-observer ordered delivery
//! - [`service`] - HTTP server exposing the scheduler, and its client
//! - [`batch`] - Semicolon separated request files and departure reports
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus metrics
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use tarmac::scheduler::{Category, RunwayScheduler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scheduler = RunwayScheduler::default();
//!     scheduler.create_runway("R1", Category::A).await?;
//!     scheduler.request_runway("AR1300", "EZE", "Aerolineas", Category::C).await?;
//!     scheduler.issue_departure().await?;
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notifications;
pub mod scheduler;
pub mod service;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, TarmacErrorTrait};
    pub use crate::notifications::{FlightEvent, FlightObserver};
    pub use crate::scheduler::{
        Assignment, Category, DepartureFilter, DepartureRecord, RunwayScheduler, RunwayStatus,
        SchedulerError,
    };
    pub use crate::service::{AirportClient, AirportServer};
}

// Direct re-exports for convenience
pub use scheduler::{Category, RunwayScheduler};
