//! Prometheus metrics
//!
//! The exporter is optional; when it is not installed every macro call is
//! a no-op, so the recording helpers are safe to use unconditionally.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus exporter, serving `/metrics` on `port`
///
/// ```ignore
/// observability::metrics::init_metrics(9090)?;
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// HTTP request metrics for one server
///
/// * `stablemap_http_requests_total{server}`
/// * `stablemap_http_requests_by_status_total{server, status}`
/// * `stablemap_http_request_duration_seconds{server}`
#[derive(Clone)]
pub struct ServerMetrics {
    requests_total: Counter,
    request_duration: Histogram,
    server_name: String,
}

impl ServerMetrics {
    pub fn new(server_name: &str) -> Self {
        let name = server_name.to_string();
        Self {
            requests_total: counter!("stablemap_http_requests_total", "server" => name.clone()),
            request_duration: histogram!("stablemap_http_request_duration_seconds", "server" => name.clone()),
            server_name: name,
        }
    }

    pub fn record_request(&self, duration: Duration, status_code: u16) {
        self.requests_total.increment(1);
        counter!(
            "stablemap_http_requests_by_status_total",
            "server" => self.server_name.clone(),
            "status" => status_code.to_string()
        )
        .increment(1);
        self.request_duration.record(duration.as_secs_f64());
    }
}

/// Records duration and status when dropped
///
/// ```ignore
/// let mut guard = RequestMetricsGuard::new(&metrics);
/// let response = handle().await;
/// guard.set_status(response.status().as_u16());
/// ```
pub struct RequestMetricsGuard<'a> {
    metrics: &'a ServerMetrics,
    start: Instant,
    status_code: u16,
}

impl<'a> RequestMetricsGuard<'a> {
    pub fn new(metrics: &'a ServerMetrics) -> Self {
        Self {
            metrics,
            start: Instant::now(),
            status_code: 200,
        }
    }

    pub fn set_status(&mut self, code: u16) {
        self.status_code = code;
    }
}

impl Drop for RequestMetricsGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_request(self.start.elapsed(), self.status_code);
    }
}

/// Why volume left the estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Exchange had no registered country and no override
    NoCountry,
    /// Attributed country has no map centroid
    NoCentroid,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCountry => "no_country",
            Self::NoCentroid => "no_centroid",
        }
    }
}

/// Data-quality and refresh metrics of the estimation pipeline
///
/// * `stablemap_dropped_volume_base{reason}` - base-unit volume dropped by the last pass
/// * `stablemap_dropped_exchanges_total` - exchanges without a resolvable country
/// * `stablemap_dropped_countries_total` - countries without a centroid
/// * `stablemap_global_volume_usd{filter}` - global estimate of the last pass
/// * `stablemap_refresh_total{outcome}` - refresh attempts
/// * `stablemap_source_up{source}` - 1 when the last fetch from a source succeeded
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_dropped_volume(&self, reason: DropReason, volume_base: f64) {
        gauge!("stablemap_dropped_volume_base", "reason" => reason.as_str()).set(volume_base);
    }

    pub fn record_dropped_exchanges(&self, count: usize) {
        counter!("stablemap_dropped_exchanges_total").increment(count as u64);
    }

    pub fn record_dropped_countries(&self, count: usize) {
        counter!("stablemap_dropped_countries_total").increment(count as u64);
    }

    pub fn record_global_volume(&self, filter: &str, volume_usd: f64) {
        gauge!("stablemap_global_volume_usd", "filter" => filter.to_string()).set(volume_usd);
    }

    pub fn record_refresh(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        counter!("stablemap_refresh_total", "outcome" => outcome).increment(1);
    }

    pub fn set_source_up(&self, source: &str, up: bool) {
        let source_gauge: Gauge = gauge!("stablemap_source_up", "source" => source.to_string());
        source_gauge.set(if up { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_metrics_creation() {
        let metrics = ServerMetrics::new("http");
        // no exporter installed: recording is a no-op
        let mut guard = RequestMetricsGuard::new(&metrics);
        guard.set_status(503);
    }

    #[test]
    fn test_pipeline_metrics_without_exporter() {
        let metrics = PipelineMetrics::new();
        metrics.record_dropped_volume(DropReason::NoCountry, 12.5);
        metrics.record_dropped_exchanges(3);
        metrics.record_global_volume("usdt", 5e10);
        metrics.record_refresh(true);
        metrics.set_source_up("coingecko", false);
        assert_eq!(DropReason::NoCentroid.as_str(), "no_centroid");
    }
}
