//! Observability for stablemap
//!
//! - Structured logging via `tracing`
//! - Prometheus metrics for the HTTP layer and the estimation pipeline
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("stablemap", LogFormat::Pretty)?;
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, DropReason, PipelineMetrics, RequestMetricsGuard, ServerMetrics};
