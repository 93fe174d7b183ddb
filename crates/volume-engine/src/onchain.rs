//! On-chain supply as a second per-country signal.
//!
//! Chain supply is spread over countries using the regional usage tables,
//! then compared with a country's exchange volume to refine how much of
//! that volume is stablecoin-denominated and which coin dominates.

use common::{ChainBreakdown, StablecoinShares};
use reference_data::ChainTables;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// USD supply attributed to one country across all chains
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OnChainCountryEstimate {
    pub country: String,
    pub usdt_volume: f64,
    pub usdc_volume: f64,
}

impl OnChainCountryEstimate {
    pub fn total(&self) -> f64 {
        self.usdt_volume + self.usdc_volume
    }
}

/// Split each chain's supply across countries: a region's portion is
/// divided evenly between its member countries.
pub fn distribute_on_chain(
    chains: &ChainTables,
    breakdown: &ChainBreakdown,
) -> HashMap<String, OnChainCountryEstimate> {
    let mut estimates: HashMap<String, OnChainCountryEstimate> = HashMap::new();

    for (chain, amounts) in breakdown {
        let Some(regions) = chains.distribution(chain) else {
            debug!(chain = %chain, "No regional distribution for chain, skipping");
            continue;
        };

        for region in regions {
            let members = region.countries.len() as f64;
            let usdt = amounts.usdt * region.share / members;
            let usdc = amounts.usdc * region.share / members;

            for country in &region.countries {
                let entry = estimates
                    .entry(country.clone())
                    .or_insert_with(|| OnChainCountryEstimate {
                        country: country.clone(),
                        ..Default::default()
                    });
                entry.usdt_volume += usdt;
                entry.usdc_volume += usdc;
            }
        }
    }

    estimates
}

/// Constants of the exchange/on-chain blend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendParams {
    /// Lower clamp of the stablecoin intensity
    pub min_intensity: f64,
    /// Upper clamp of the stablecoin intensity
    pub max_intensity: f64,
    /// Portion of the intensity attributed to the USDT/USDC pair
    pub pair_coverage: f64,
    /// Portion of the intensity attributed to DAI
    pub dai_share: f64,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self {
            min_intensity: 0.60,
            max_intensity: 0.96,
            pair_coverage: 0.92,
            dai_share: 0.02,
        }
    }
}

/// Blend a country's exchange volume with its on-chain estimate.
///
/// Returns `None` when the country has no on-chain presence, in which case
/// the caller falls back to static weights.
pub fn compute_blended_weights(
    exchange_volume_usd: f64,
    country: &str,
    estimates: &HashMap<String, OnChainCountryEstimate>,
    params: &BlendParams,
) -> Option<StablecoinShares> {
    let estimate = estimates.get(country)?;
    let total = estimate.total();
    if total <= 0.0 {
        return None;
    }

    let divisor = if exchange_volume_usd != 0.0 {
        exchange_volume_usd
    } else {
        total
    };
    let intensity = (total / divisor)
        .max(params.min_intensity)
        .min(params.max_intensity);

    let all = intensity;
    Some(StablecoinShares {
        usdt: all * (estimate.usdt_volume / total) * params.pair_coverage,
        usdc: all * (estimate.usdc_volume / total) * params.pair_coverage,
        dai: all * params.dai_share,
        all,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ChainAmounts;
    use reference_data::ReferenceData;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * a.abs().max(1.0)
    }

    fn breakdown(entries: &[(&str, f64, f64)]) -> ChainBreakdown {
        entries
            .iter()
            .map(|(chain, usdt, usdc)| (chain.to_string(), ChainAmounts { usdt: *usdt, usdc: *usdc }))
            .collect()
    }

    #[test]
    fn test_distribution_conserves_chain_amount() {
        let data = ReferenceData::builtin().unwrap();
        let input = breakdown(&[("tron", 60e9, 1e9)]);
        let estimates = distribute_on_chain(&data.chains, &input);

        let shares: f64 = data.chains.distribution("tron").unwrap().iter().map(|r| r.share).sum();
        let usdt: f64 = estimates.values().map(|e| e.usdt_volume).sum();
        let usdc: f64 = estimates.values().map(|e| e.usdc_volume).sum();
        assert!(close(usdt, 60e9 * shares));
        assert!(close(usdc, 1e9 * shares));
    }

    #[test]
    fn test_region_splits_evenly() {
        let data = ReferenceData::builtin().unwrap();
        let estimates = distribute_on_chain(&data.chains, &breakdown(&[("tron", 14e9, 0.0)]));
        let asia = &data.chains.distribution("tron").unwrap()[0];
        let per_country = 14e9 * asia.share / asia.countries.len() as f64;
        let vietnam = estimates.get("Vietnam").unwrap();
        assert!(close(vietnam.usdt_volume, per_country));
        assert_eq!(vietnam.country, "Vietnam");
    }

    #[test]
    fn test_unknown_chain_is_ignored() {
        let data = ReferenceData::builtin().unwrap();
        let estimates = distribute_on_chain(&data.chains, &breakdown(&[("polygon", 5e9, 5e9)]));
        assert!(estimates.is_empty());
    }

    #[test]
    fn test_countries_accumulate_across_chains() {
        let data = ReferenceData::builtin().unwrap();
        let one = distribute_on_chain(&data.chains, &breakdown(&[("tron", 1e9, 0.0)]));
        let two = distribute_on_chain(&data.chains, &breakdown(&[("tron", 1e9, 0.0), ("ethereum", 1e9, 0.0)]));
        let us_one = one.get("United States").map(|e| e.usdt_volume).unwrap_or(0.0);
        let us_two = two.get("United States").map(|e| e.usdt_volume).unwrap_or(0.0);
        assert!(us_two > us_one);
    }

    fn estimates_for(country: &str, usdt: f64, usdc: f64) -> HashMap<String, OnChainCountryEstimate> {
        HashMap::from([(
            country.to_string(),
            OnChainCountryEstimate { country: country.to_string(), usdt_volume: usdt, usdc_volume: usdc },
        )])
    }

    #[test]
    fn test_blend_missing_or_empty_country() {
        let params = BlendParams::default();
        assert!(compute_blended_weights(1e9, "Chile", &HashMap::new(), &params).is_none());
        let empty = estimates_for("Chile", 0.0, 0.0);
        assert!(compute_blended_weights(1e9, "Chile", &empty, &params).is_none());
    }

    #[test]
    fn test_blend_clamps_intensity() {
        let params = BlendParams::default();
        let est = estimates_for("Chile", 75.0, 25.0);

        // on-chain far below exchange volume: clamped up to the floor
        let low = compute_blended_weights(1e6, "Chile", &est, &params).unwrap();
        assert!(close(low.all, 0.60));
        assert!(close(low.usdt, 0.60 * 0.75 * 0.92));
        assert!(close(low.usdc, 0.60 * 0.25 * 0.92));
        assert!(close(low.dai, 0.60 * 0.02));

        // on-chain far above exchange volume: clamped down to the ceiling
        let high = compute_blended_weights(1.0, "Chile", &est, &params).unwrap();
        assert!(close(high.all, 0.96));

        // inside the band the ratio is used as is
        let mid = compute_blended_weights(125.0, "Chile", &est, &params).unwrap();
        assert!(close(mid.all, 0.80));
    }

    #[test]
    fn test_blend_zero_exchange_volume() {
        let params = BlendParams::default();
        let est = estimates_for("Chile", 10.0, 0.0);
        let w = compute_blended_weights(0.0, "Chile", &est, &params).unwrap();
        // ratio is 1.0, clamped to the ceiling
        assert!(close(w.all, 0.96));
        assert!(close(w.usdc, 0.0));
    }
}
