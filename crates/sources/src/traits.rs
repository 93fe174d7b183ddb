//! Source traits - transport agnostic

use async_trait::async_trait;
use common::{Exchange, LiveOnChainData, VerifiedVolumes};

use crate::error::SourceResult;

/// Exchange listing and the price of the asset its volumes are quoted in
#[async_trait]
pub trait ExchangeSource: Send + Sync {
    /// Every exchange the source lists. Implementations return partial
    /// results when some pages fail, and error only when nothing came back.
    async fn fetch_exchanges(&self) -> SourceResult<Vec<Exchange>>;

    /// USD price of the base asset
    async fn fetch_base_price(&self) -> SourceResult<f64>;
}

/// Global stablecoin supply and its per-chain breakdown
#[async_trait]
pub trait OnChainSource: Send + Sync {
    async fn fetch_on_chain(&self) -> SourceResult<LiveOnChainData>;
}

/// Externally reported 24h stablecoin volume
#[async_trait]
pub trait VolumeSource: Send + Sync {
    async fn fetch_verified_volumes(&self) -> SourceResult<VerifiedVolumes>;
}
