//! Fetched inputs and the cache that holds the latest set.

use chrono::{DateTime, Utc};
use common::{Exchange, LiveOnChainData, StablecoinFilter, VerifiedVolumes};
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;
use volume_engine::{AggregationInput, Calibration};

/// Everything one refresh fetched, plus the calibration derived from it
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: Uuid,
    pub fetched_at: DateTime<Utc>,
    pub exchanges: Vec<Exchange>,
    pub base_price: f64,
    pub on_chain: Option<LiveOnChainData>,
    pub verified: Option<VerifiedVolumes>,
    /// Present exactly when `on_chain` is
    pub calibration: Option<Calibration>,
}

impl Snapshot {
    pub fn new(
        exchanges: Vec<Exchange>,
        base_price: f64,
        on_chain: Option<LiveOnChainData>,
        verified: Option<VerifiedVolumes>,
        calibration: Option<Calibration>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fetched_at: Utc::now(),
            exchanges,
            base_price,
            on_chain,
            verified,
            calibration,
        }
    }

    pub fn input(&self, filter: StablecoinFilter) -> AggregationInput<'_> {
        AggregationInput::new(&self.exchanges, self.base_price, filter)
            .with_on_chain(self.on_chain.as_ref())
            .with_verified(self.verified.as_ref())
            .with_calibration(self.calibration.as_ref())
    }
}

/// Latest snapshot, replaced wholesale on each successful refresh.
/// Readers keep their `Arc` for as long as they aggregate.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_none()
    }
}
