//! Volume service for stablemap
//!
//! Owns the fetch-calibrate-cache cycle around the estimation core:
//!
//! - [`VolumeService`] fetches exchanges, on-chain supply and verified
//!   volume concurrently and keeps the latest [`Snapshot`]
//! - [`RefreshWorker`] refreshes it on an interval until shutdown
//! - requests aggregate the current snapshot for the requested filter
//!
//! # Feature Flags
//!
//! - `api` - Axum routes (enabled by default)
//! - `client` - build the service from config with the live HTTP sources

pub mod bootstrap;
pub mod error;
pub mod service;
pub mod snapshot;
pub mod worker;

#[cfg(feature = "api")]
pub mod api;

#[cfg(test)]
mod testing;

pub use bootstrap::{aggregator, load_reference_data};
pub use error::{ServiceError, ServiceResult};
pub use service::{StablecoinStats, VolumeResponse, VolumeService};
pub use snapshot::{Snapshot, SnapshotCache};
pub use worker::RefreshWorker;

#[cfg(feature = "api")]
pub use api::app_router;
