//! Static country weights and their drift correction against live market share.
//!
//! The per-country tables were authored against a fixed picture of the
//! global market (USDT 65%, USDC 22%, DAI 3%). When live supply data says
//! the market has moved, every country's share of a coin is scaled by the
//! same ratio `live / baseline`. Relative differences between countries are
//! kept while the overall mix tracks the market.

use common::{LiveShares, StablecoinShares};
use reference_data::ReferenceData;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Baseline shares and caps applied during calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Global mix the static tables were authored against
    pub baseline: LiveShares,
    /// Upper bound for a single coin's calibrated share
    pub coin_cap: f64,
    /// Upper bound for the calibrated `all` share
    pub all_cap: f64,
    /// Added on top of usdt + usdc + dai for every other stablecoin
    pub other_margin: f64,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            baseline: LiveShares::new(0.65, 0.22, 0.03),
            coin_cap: 0.95,
            all_cap: 0.98,
            other_margin: 0.05,
        }
    }
}

/// Drift ratios computed from one live market-share observation.
///
/// Immutable; a refresh produces a new value rather than mutating this one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub usdt_ratio: f64,
    pub usdc_ratio: f64,
    pub dai_ratio: f64,
}

impl Calibration {
    pub const IDENTITY: Calibration = Calibration {
        usdt_ratio: 1.0,
        usdc_ratio: 1.0,
        dai_ratio: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

fn drift(live: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        live / baseline
    } else {
        1.0
    }
}

/// Resolves country weights from the static tables and applies calibration
#[derive(Debug, Clone)]
pub struct WeightCalibrator {
    data: Arc<ReferenceData>,
    params: CalibrationParams,
}

impl WeightCalibrator {
    pub fn new(data: Arc<ReferenceData>, params: CalibrationParams) -> Self {
        Self { data, params }
    }

    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    /// Compute drift ratios for the given live shares
    pub fn calibrate(&self, live: LiveShares) -> Calibration {
        let baseline = self.params.baseline;
        let calibration = Calibration {
            usdt_ratio: drift(live.usdt, baseline.usdt),
            usdc_ratio: drift(live.usdc, baseline.usdc),
            dai_ratio: drift(live.dai, baseline.dai),
        };
        debug!(?live, ?calibration, "Computed weight calibration");
        calibration
    }

    /// Uncalibrated shares: country override, then region default, then
    /// the global fallback
    pub fn base_weights(&self, country: &str) -> StablecoinShares {
        let tables = &self.data.weights;
        let region_default = tables
            .region_of(country)
            .and_then(|region| tables.region_default(region));

        match tables.override_for(country) {
            Some(partial) => partial.as_complete().unwrap_or_else(|| {
                partial.merge_onto(region_default.unwrap_or_else(|| tables.global_default()))
            }),
            None => region_default.unwrap_or_else(|| tables.global_default()),
        }
    }

    /// Country weights with the calibration applied, if there is one
    pub fn country_weights(&self, country: &str, calibration: Option<&Calibration>) -> StablecoinShares {
        let base = self.base_weights(country);
        match calibration {
            Some(c) if !c.is_identity() => self.apply(base, c),
            _ => base,
        }
    }

    fn apply(&self, base: StablecoinShares, c: &Calibration) -> StablecoinShares {
        let cap = self.params.coin_cap;
        let usdt = (base.usdt * c.usdt_ratio).min(cap);
        let usdc = (base.usdc * c.usdc_ratio).min(cap);
        let dai = (base.dai * c.dai_ratio).min(cap);
        let all = (usdt + usdc + dai + self.params.other_margin).min(self.params.all_cap);
        StablecoinShares { usdt, usdc, dai, all }
    }
}
