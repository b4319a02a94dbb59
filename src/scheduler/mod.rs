//! Runway scheduling core
//!
//! This module holds the in-memory model of runways and their departure
//! queues, the best-fit assignment algorithm, the departure tick, bulk
//! reassignment, and the locking discipline that keeps all of it safe under
//! many concurrent callers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       RunwayScheduler                        │
//! │  ┌──────────────────────────┐   ┌─────────────────────────┐  │
//! │  │ RetryLock<RunwayTable>   │──▶│ RetryLock<Callback      │  │
//! │  │  runways, queues,        │   │           Registry>     │  │
//! │  │  history, flight ids     │   │  flight id → lanes      │  │
//! │  └────────────┬─────────────┘   └────────────┬────────────┘  │
//! │               │ assignment / tick / drain     │ push events  │
//! └───────────────┼───────────────────────────────┼──────────────┘
//!                 ▼                               ▼
//!          DepartureRecord                    Notifier
//!          projections                  (bounded deliveries)
//! ```
//!
//! The arrow between the locks is the acquisition order: an operation that
//! needs both takes the runway lock first.
//!
//! # Modules
//!
//! - [`category`] - Ordered runway/flight categories
//! - [`flight`] - Flight records
//! - [`runway`] - Runway queue and departure history
//! - [`assignment`] - Best-fit runway selection
//! - [`table`] - The runway table behind the runway lock
//! - [`lock`] - Bounded-retry lock acquisition
//! - [`query`] - Departure history projections
//! - [`engine`] - The scheduler and its operations
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tarmac::notifications::LoggingObserver;
//! use tarmac::scheduler::{Category, RunwayScheduler};
//!
//! let scheduler = RunwayScheduler::default();
//! scheduler.create_runway("R1", Category::A).await?;
//! scheduler.request_runway("AR1300", "EZE", "Aerolineas", Category::B).await?;
//! scheduler.subscribe("AR1300", "Aerolineas", Arc::new(LoggingObserver::new("Aerolineas"))).await?;
//!
//! let summary = scheduler.issue_departure().await?;
//! assert_eq!(summary.departed, vec!["AR1300"]);
//! ```

pub mod assignment;
pub mod category;
pub mod engine;
pub mod error;
pub mod flight;
pub mod lock;
pub mod query;
pub mod runway;
pub mod table;

// Re-exports for convenience
pub use category::Category;
pub use engine::{DepartureSummary, RearrangeSummary, RunwayScheduler};
pub use error::{ErrorKind, SchedulerError, SchedulerResult};
pub use flight::Flight;
pub use lock::{LockPolicy, RetryLock};
pub use query::{DepartureFilter, DepartureRecord};
pub use runway::{Runway, RunwayStatus};
pub use table::Assignment;
