//! Per-country stablecoin volume estimation for stablemap
//!
//! This crate implements the estimation core. It is synchronous and
//! stateless: every call takes its inputs by reference and returns fresh
//! values, so it can be shared freely across tasks.
//!
//! # Modules
//!
//! - [`attribution`] - exchange volume to user countries
//! - [`calibration`] - static country weights and drift correction
//! - [`onchain`] - chain supply to countries, and the exchange/on-chain blend
//! - [`aggregator`] - the full pipeline producing [`AggregationResult`]
//! - [`features`] - GeoJSON output for map clients
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use volume_engine::{AggregationInput, Aggregator, BlendParams, CalibrationParams};
//!
//! let data = Arc::new(reference_data::ReferenceData::builtin()?);
//! let aggregator = Aggregator::new(data, CalibrationParams::default(), BlendParams::default());
//! let result = aggregator.aggregate(AggregationInput::new(&exchanges, 60_000.0, filter));
//! ```

pub mod aggregator;
pub mod attribution;
pub mod calibration;
pub mod features;
pub mod onchain;

pub use aggregator::{
    AggregationInput, AggregationResult, Aggregator, CountryVolume, Diagnostics,
    DEFAULT_TOP_COUNTRIES,
};
pub use attribution::{attribute_exchanges, Attribution, AttributionStats, CountryAccumulator};
pub use calibration::{Calibration, CalibrationParams, WeightCalibrator};
pub use features::{FeatureCollection, PointFeature};
pub use onchain::{compute_blended_weights, distribute_on_chain, BlendParams, OnChainCountryEstimate};
