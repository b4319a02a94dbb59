pub mod flights;
pub mod management;
pub mod serve;

// Re-export command functions for convenience
pub use flights::{query, request, track};
pub use management::{reorder, runway, takeoff, RunwayAction};
pub use serve::{serve, ServeParams};
