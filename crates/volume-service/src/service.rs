//! Volume service: refreshes upstream inputs and serves estimates.

use common::{LiveOnChainData, StablecoinFilter};
use observability::{DropReason, PipelineMetrics};
use reference_data::ReferenceData;
use serde::Serialize;
use server::{HealthState, SourceStatus};
use sources::{ExchangeSource, OnChainSource, SourceResult, StaticSources, VolumeSource};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use volume_engine::{AggregationResult, Aggregator};

use crate::error::{ServiceError, ServiceResult};
use crate::snapshot::{Snapshot, SnapshotCache};

const EXCHANGES: &str = "exchanges";
const BASE_PRICE: &str = "base_price";
const ON_CHAIN: &str = "on_chain";
const VERIFIED_VOLUME: &str = "verified_volume";

/// Market caps and dominance of the tracked stablecoins.
/// Dominance is a percentage with one decimal, e.g. `"61.3"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StablecoinStats {
    pub usdt_market_cap: f64,
    pub usdc_market_cap: f64,
    pub dai_market_cap: f64,
    pub total_market_cap: f64,
    pub usdt_dominance: String,
    pub usdc_dominance: String,
    pub dai_dominance: String,
}

impl From<&LiveOnChainData> for StablecoinStats {
    fn from(data: &LiveOnChainData) -> Self {
        let pct = |share: f64| format!("{:.1}", share * 100.0);
        Self {
            usdt_market_cap: data.usdt_market_cap,
            usdc_market_cap: data.usdc_market_cap,
            dai_market_cap: data.dai_market_cap,
            total_market_cap: data.total_market_cap,
            usdt_dominance: pct(data.shares.usdt),
            usdc_dominance: pct(data.shares.usdc),
            dai_dominance: pct(data.shares.dai),
        }
    }
}

/// Body of `GET /api/v1/volume`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeResponse {
    #[serde(flatten)]
    pub result: AggregationResult,
    /// Fetch time of the inputs, RFC 3339
    pub last_updated: String,
    pub base_price: f64,
    pub snapshot_id: Uuid,
    pub stablecoin_stats: Option<StablecoinStats>,
}

impl VolumeResponse {
    fn new(result: AggregationResult, snapshot: &Snapshot) -> Self {
        Self {
            result,
            last_updated: snapshot.fetched_at.to_rfc3339(),
            base_price: snapshot.base_price,
            snapshot_id: snapshot.id,
            stablecoin_stats: snapshot.on_chain.as_ref().map(StablecoinStats::from),
        }
    }
}

pub struct VolumeService {
    aggregator: Aggregator,
    exchanges: Arc<dyn ExchangeSource>,
    on_chain: Arc<dyn OnChainSource>,
    volumes: Arc<dyn VolumeSource>,
    cache: SnapshotCache,
    metrics: PipelineMetrics,
    health: Arc<HealthState>,
}

impl VolumeService {
    pub fn new(
        aggregator: Aggregator,
        exchanges: Arc<dyn ExchangeSource>,
        on_chain: Arc<dyn OnChainSource>,
        volumes: Arc<dyn VolumeSource>,
    ) -> Self {
        Self {
            aggregator,
            exchanges,
            on_chain,
            volumes,
            cache: SnapshotCache::new(),
            metrics: PipelineMetrics::new(),
            health: Arc::new(HealthState::new("stablemap")),
        }
    }

    /// All inputs served by one [`StaticSources`]
    pub fn with_static_sources(aggregator: Aggregator, sources: Arc<StaticSources>) -> Self {
        Self::new(aggregator, sources.clone(), sources.clone(), sources)
    }

    /// Share a health state with the HTTP layer
    pub fn with_health(mut self, health: Arc<HealthState>) -> Self {
        self.health = health;
        self
    }

    pub fn health(&self) -> &Arc<HealthState> {
        &self.health
    }

    pub fn reference_data(&self) -> &Arc<ReferenceData> {
        self.aggregator.reference_data()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.cache.current()
    }

    /// Fetch every input concurrently and swap in a new snapshot.
    ///
    /// The exchange list and base price are required; on a failure there the
    /// previous snapshot stays in place. On-chain supply and verified volume
    /// degrade to `None`.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> ServiceResult<Arc<Snapshot>> {
        let (exchanges, base_price, on_chain, verified) = tokio::join!(
            timed(self.exchanges.fetch_exchanges()),
            timed(self.exchanges.fetch_base_price()),
            timed(self.on_chain.fetch_on_chain()),
            timed(self.volumes.fetch_verified_volumes()),
        );

        let exchanges = self.observe(EXCHANGES, exchanges);
        let base_price = self.observe(BASE_PRICE, base_price);
        let on_chain = self.observe(ON_CHAIN, on_chain).ok();
        let verified = self.observe(VERIFIED_VOLUME, verified).ok();

        let (exchanges, base_price) = match (exchanges, base_price) {
            (Ok(exchanges), Ok(price)) => (exchanges, price),
            (Err(error), _) => return Err(self.refresh_failed(EXCHANGES, error)),
            (_, Err(error)) => return Err(self.refresh_failed(BASE_PRICE, error)),
        };

        let calibration = on_chain
            .as_ref()
            .map(|data| self.aggregator.calibrator().calibrate(data.shares));

        let snapshot = self.cache.replace(Snapshot::new(
            exchanges,
            base_price,
            on_chain,
            verified,
            calibration,
        ));

        let result = self.aggregator.aggregate(snapshot.input(StablecoinFilter::All));
        self.record_pass(&result);
        self.metrics.record_refresh(true);

        info!(
            snapshot = %snapshot.id,
            exchanges = snapshot.exchanges.len(),
            base_price = snapshot.base_price,
            on_chain = snapshot.on_chain.is_some(),
            verified = snapshot.verified.is_some(),
            countries = result.country_count,
            global_volume = result.global_volume,
            "Refreshed volume snapshot"
        );
        Ok(snapshot)
    }

    /// Estimate for `filter` from the current snapshot
    pub fn volume(&self, filter: StablecoinFilter) -> ServiceResult<VolumeResponse> {
        let snapshot = self.cache.current().ok_or(ServiceError::NotReady)?;
        let result = self.aggregator.aggregate(snapshot.input(filter));
        self.metrics
            .record_global_volume(filter.as_str(), result.global_volume);
        debug!(%filter, snapshot = %snapshot.id, "Served volume estimate");
        Ok(VolumeResponse::new(result, &snapshot))
    }

    /// Report one fetch to health and metrics, passing the result through
    fn observe<T>(&self, input: &'static str, (result, latency_ms): (SourceResult<T>, u64)) -> SourceResult<T> {
        let status = match &result {
            Ok(_) => SourceStatus::up(input, latency_ms),
            Err(e) => {
                warn!(input, error = %e, "Upstream fetch failed");
                SourceStatus::down(input, e.to_string())
            }
        };
        self.metrics.set_source_up(input, status.up);
        self.health.update_source(status);
        result
    }

    fn refresh_failed(&self, input: &'static str, error: sources::SourceError) -> ServiceError {
        self.metrics.record_refresh(false);
        if !self.cache.is_empty() {
            warn!(input, "Refresh failed, keeping previous snapshot");
        }
        ServiceError::Upstream { input, error }
    }

    fn record_pass(&self, result: &AggregationResult) {
        let diagnostics = &result.diagnostics;
        self.metrics
            .record_dropped_volume(DropReason::NoCountry, diagnostics.attribution.skipped_volume);
        self.metrics
            .record_dropped_volume(DropReason::NoCentroid, diagnostics.unmapped_volume_base);
        self.metrics
            .record_dropped_exchanges(diagnostics.attribution.exchanges_dropped);
        self.metrics
            .record_dropped_countries(diagnostics.unmapped_countries.len());
        self.metrics
            .record_global_volume(result.filter.as_str(), result.global_volume);
    }
}

async fn timed<T>(fetch: impl Future<Output = SourceResult<T>>) -> (SourceResult<T>, u64) {
    let started = Instant::now();
    let result = fetch.await;
    (result, started.elapsed().as_millis() as u64)
}
