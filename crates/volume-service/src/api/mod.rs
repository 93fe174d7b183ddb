//! HTTP API for volume estimates and regulation lookups.
//!
//! - `handlers` - Axum handlers over a shared [`VolumeService`](crate::VolumeService)
//! - `routes` - router assembly, including health and middleware

pub mod handlers;
pub mod routes;

pub use routes::{app_router, volume_routes};
