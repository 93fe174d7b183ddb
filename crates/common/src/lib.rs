//! Common types and utilities for stablemap
//!
//! This crate provides the domain types shared by the estimation engine,
//! the data sources and the HTTP service.
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - Exchanges, stablecoin filters, share vectors, on-chain and verified volume inputs

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
