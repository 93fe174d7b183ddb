//! Shared fixtures for the service tests.

use async_trait::async_trait;
use common::{ChainAmounts, Exchange, LiveOnChainData, LiveShares, VerifiedVolumes};
use reference_data::ReferenceData;
use sources::{ExchangeSource, FixtureData, SourceError, SourceResult, StaticSources};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use volume_engine::{Aggregator, BlendParams, CalibrationParams};

use crate::service::VolumeService;

pub(crate) fn aggregator() -> Aggregator {
    let data = Arc::new(ReferenceData::builtin().unwrap());
    Aggregator::new(data, CalibrationParams::default(), BlendParams::default())
}

pub(crate) fn fixture() -> FixtureData {
    let chain_breakdown = [
        ("tron", ChainAmounts { usdt: 60e9, usdc: 0.0 }),
        ("ethereum", ChainAmounts { usdt: 70e9, usdc: 35e9 }),
        ("base", ChainAmounts { usdt: 0.0, usdc: 4e9 }),
    ]
    .into_iter()
    .map(|(chain, amounts)| (chain.to_string(), amounts))
    .collect();

    FixtureData {
        exchanges: vec![
            Exchange::new("binance", "Binance", Some("Cayman Islands"), 1000.0).with_trust_score(10.0),
            Exchange::new("upbit", "Upbit", None, 300.0).with_trust_score(10.0),
            Exchange::new("bitso", "Bitso", Some("Mexico"), 40.0).with_trust_score(8.0),
            Exchange::new("kraken", "Kraken", Some("United States"), 200.0).with_trust_score(10.0),
            Exchange::new("nowhere", "Nowhere", None, 25.0),
        ],
        base_price: 60_000.0,
        on_chain: Some(LiveOnChainData {
            usdt_market_cap: 130e9,
            usdc_market_cap: 44e9,
            dai_market_cap: 6e9,
            total_market_cap: 200e9,
            shares: LiveShares::new(0.65, 0.22, 0.03),
            chain_breakdown,
        }),
        verified: Some(VerifiedVolumes { usdt: 50e9, usdc: 20e9, dai: 2e9, total: 80e9 }),
    }
}

pub(crate) fn service_with(data: FixtureData) -> (VolumeService, Arc<StaticSources>) {
    let sources = Arc::new(StaticSources::new(data));
    let service = VolumeService::with_static_sources(aggregator(), sources.clone());
    (service, sources)
}

/// Exchange source that can be switched off between refreshes
pub(crate) struct SwitchableExchanges {
    inner: Arc<StaticSources>,
    down: AtomicBool,
}

impl SwitchableExchanges {
    pub(crate) fn new(inner: Arc<StaticSources>) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
        }
    }

    pub(crate) fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExchangeSource for SwitchableExchanges {
    async fn fetch_exchanges(&self) -> SourceResult<Vec<Exchange>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SourceError::RateLimited { provider: "test" });
        }
        self.inner.fetch_exchanges().await
    }

    async fn fetch_base_price(&self) -> SourceResult<f64> {
        self.inner.fetch_base_price().await
    }
}
