//! Remote access to the runway scheduler
//!
//! This module puts one shared scheduler behind a small REST API and
//! provides the matching client used by the command line tools.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Airport Server              │
//! │                                          │
//! │  ┌────────────────────────────────────┐  │
//! │  │             REST API               │  │
//! │  │  GET  /api/health                  │  │
//! │  │  POST /api/runways                 │  │
//! │  │  GET  /api/runways/{name}          │  │
//! │  │  POST /api/runways/{name}/open     │  │
//! │  │  POST /api/runways/{name}/close    │  │
//! │  │  POST /api/flights                 │  │
//! │  │  GET  /api/flights/{id}/track  SSE │  │
//! │  │  POST /api/departures/issue        │  │
//! │  │  POST /api/departures/rearrange    │  │
//! │  │  GET  /api/departures              │  │
//! │  │  GET  /metrics                     │  │
//! │  └────────────────────────────────────┘  │
//! │                  │                       │
//! │        Arc<RunwayScheduler>              │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tarmac::service::{AirportServer, AirportClient};
//!
//! let server = AirportServer::from_config(&config)?;
//! server.start().await?;
//!
//! let client = AirportClient::connect("http://127.0.0.1:7070")?;
//! let status = client.runway_status("R1").await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod server;

// Re-export main types
pub use api::create_router;
pub use client::{AirportClient, ClientConfig, ClientError, FlightEventStream};
pub use config::ServerConfig;
pub use server::{AirportServer, AppState, ServerError, ServerInfo};
