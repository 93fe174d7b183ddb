//! Sources backed by fixed data, for tests and offline runs.

use async_trait::async_trait;
use common::{Exchange, LiveOnChainData, VerifiedVolumes};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{SourceError, SourceResult};
use crate::traits::{ExchangeSource, OnChainSource, VolumeSource};

const PROVIDER: &str = "static";

/// Snapshot of every upstream input, as read from a JSON fixture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureData {
    pub exchanges: Vec<Exchange>,
    pub base_price: f64,
    #[serde(default)]
    pub on_chain: Option<LiveOnChainData>,
    #[serde(default)]
    pub verified: Option<VerifiedVolumes>,
}

/// Serves a [`FixtureData`]; an absent optional input behaves like a failed fetch
#[derive(Debug, Default)]
pub struct StaticSources {
    data: FixtureData,
    exchanges_unavailable: bool,
    exchange_fetches: AtomicUsize,
}

impl StaticSources {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        let fixture = |message: String| SourceError::Fixture {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| fixture(e.to_string()))?;
        let data: FixtureData = serde_json::from_str(&content).map_err(|e| fixture(e.to_string()))?;
        Ok(Self::new(data))
    }

    /// Make the exchange listing fail, as when the upstream is down
    pub fn with_exchanges_unavailable(mut self) -> Self {
        self.exchanges_unavailable = true;
        self
    }

    /// Number of `fetch_exchanges` calls served so far
    pub fn exchange_fetches(&self) -> usize {
        self.exchange_fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExchangeSource for StaticSources {
    async fn fetch_exchanges(&self) -> SourceResult<Vec<Exchange>> {
        self.exchange_fetches.fetch_add(1, Ordering::Relaxed);
        if self.exchanges_unavailable {
            return Err(SourceError::Request {
                provider: PROVIDER,
                message: "exchange listing unavailable".to_string(),
            });
        }
        Ok(self.data.exchanges.clone())
    }

    async fn fetch_base_price(&self) -> SourceResult<f64> {
        if self.data.base_price > 0.0 {
            Ok(self.data.base_price)
        } else {
            Err(SourceError::no_data(PROVIDER, "no base price"))
        }
    }
}

#[async_trait]
impl OnChainSource for StaticSources {
    async fn fetch_on_chain(&self) -> SourceResult<LiveOnChainData> {
        self.data
            .on_chain
            .clone()
            .ok_or_else(|| SourceError::no_data(PROVIDER, "no on-chain data"))
    }
}

#[async_trait]
impl VolumeSource for StaticSources {
    async fn fetch_verified_volumes(&self) -> SourceResult<VerifiedVolumes> {
        self.data
            .verified
            .ok_or_else(|| SourceError::no_data(PROVIDER, "no verified volumes"))
    }
}
