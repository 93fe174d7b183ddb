//! Per-country volume aggregation.
//!
//! One call runs four passes over the inputs:
//!
//! 1. **Attribution** - exchange volume is assigned to user countries
//!    ([`attribute_exchanges`]).
//! 2. **Scoring** - every country is mapped to its centroid, converted to
//!    USD and weighted by its stablecoin bias for the requested filter.
//!    The bias comes from the on-chain blend when one is available and from
//!    the calibrated static weights otherwise.
//! 3. **Rescaling** - scores are turned into shares of a target volume. With
//!    verified volumes the target is the verified figure for the filter, so
//!    the heuristics decide the distribution and never the total.
//! 4. **Output** - countries sorted by volume, normalized against the
//!    largest, plus the GeoJSON feature collection.
//!
//! The aggregator holds no mutable state. Calibration is passed in with the
//! inputs, so concurrent calls never observe each other.

use common::{Exchange, LiveOnChainData, StablecoinFilter, VerifiedVolumes};
use ordered_float::OrderedFloat;
use reference_data::{Centroid, ReferenceData};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::attribution::{attribute_exchanges, AttributionStats, CountryAccumulator};
use crate::calibration::{Calibration, CalibrationParams, WeightCalibrator};
use crate::features::FeatureCollection;
use crate::onchain::{compute_blended_weights, distribute_on_chain, BlendParams};

pub const DEFAULT_TOP_COUNTRIES: usize = 10;

/// Estimated volume for one country
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryVolume {
    pub country: String,
    pub iso2: String,
    pub iso3: String,
    pub lat: f64,
    pub lng: f64,
    pub volume_usd: f64,
    pub volume_base: f64,
    pub exchange_count: u32,
    pub top_exchange: String,
    pub volume_normalized: f64,
}

/// Inputs of one aggregation call
#[derive(Debug, Clone, Copy)]
pub struct AggregationInput<'a> {
    pub exchanges: &'a [Exchange],
    pub base_price_usd: f64,
    pub filter: StablecoinFilter,
    pub on_chain: Option<&'a LiveOnChainData>,
    pub verified: Option<&'a VerifiedVolumes>,
    pub calibration: Option<&'a Calibration>,
}

impl<'a> AggregationInput<'a> {
    /// Exchange data only: static weights and raw scores
    pub fn new(exchanges: &'a [Exchange], base_price_usd: f64, filter: StablecoinFilter) -> Self {
        Self {
            exchanges,
            base_price_usd,
            filter,
            on_chain: None,
            verified: None,
            calibration: None,
        }
    }

    pub fn with_on_chain(mut self, on_chain: Option<&'a LiveOnChainData>) -> Self {
        self.on_chain = on_chain;
        self
    }

    pub fn with_verified(mut self, verified: Option<&'a VerifiedVolumes>) -> Self {
        self.verified = verified;
        self
    }

    pub fn with_calibration(mut self, calibration: Option<&'a Calibration>) -> Self {
        self.calibration = calibration;
        self
    }
}

/// What the pipeline dropped or approximated along the way
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub attribution: AttributionStats,
    /// Attributed country names with no centroid
    pub unmapped_countries: Vec<String>,
    pub unmapped_volume_base: f64,
    /// Countries whose bias came from the on-chain blend
    pub blended_countries: usize,
    /// Rescaling target, `None` when scores were used as is
    pub target_volume: Option<f64>,
    pub total_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub filter: StablecoinFilter,
    /// Every mapped country, descending by `volume_usd`
    pub countries: Vec<CountryVolume>,
    pub top_countries: Vec<CountryVolume>,
    pub global_volume: f64,
    pub country_count: usize,
    pub point_features: FeatureCollection,
    pub diagnostics: Diagnostics,
}

struct Scored<'a> {
    centroid: &'a Centroid,
    acc: CountryAccumulator,
    score: f64,
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    data: Arc<ReferenceData>,
    calibrator: WeightCalibrator,
    blend: BlendParams,
    top_countries: usize,
}

impl Aggregator {
    pub fn new(data: Arc<ReferenceData>, calibration: CalibrationParams, blend: BlendParams) -> Self {
        Self {
            calibrator: WeightCalibrator::new(Arc::clone(&data), calibration),
            data,
            blend,
            top_countries: DEFAULT_TOP_COUNTRIES,
        }
    }

    /// Number of countries reported in `top_countries`
    pub fn with_top_countries(mut self, n: usize) -> Self {
        self.top_countries = n;
        self
    }

    pub fn calibrator(&self) -> &WeightCalibrator {
        &self.calibrator
    }

    pub fn reference_data(&self) -> &Arc<ReferenceData> {
        &self.data
    }

    pub fn aggregate(&self, input: AggregationInput<'_>) -> AggregationResult {
        let attribution = attribute_exchanges(&self.data.exchanges, input.exchanges);
        let mut diagnostics = Diagnostics {
            attribution: attribution.stats,
            ..Default::default()
        };

        let merged = self.map_to_centroids(attribution.countries, &mut diagnostics);
        let scored = self.score(merged, &input, &mut diagnostics);
        let countries = self.rescale(scored, &input, &mut diagnostics);

        let global_volume: f64 = countries.iter().map(|c| c.volume_usd).sum();
        let top_countries = countries.iter().take(self.top_countries).cloned().collect();
        let point_features = FeatureCollection::from_countries(&countries);

        debug!(
            filter = %input.filter,
            countries = countries.len(),
            global_volume,
            "Aggregation complete"
        );

        AggregationResult {
            filter: input.filter,
            country_count: countries.len(),
            countries,
            top_countries,
            global_volume,
            point_features,
            diagnostics,
        }
    }

    /// Resolve centroids, merging accumulators that name the same country
    fn map_to_centroids(
        &self,
        accumulators: BTreeMap<String, CountryAccumulator>,
        diagnostics: &mut Diagnostics,
    ) -> BTreeMap<String, (&Centroid, CountryAccumulator)> {
        let mut merged: BTreeMap<String, (&Centroid, CountryAccumulator)> = BTreeMap::new();

        for (name, acc) in accumulators {
            let Some(centroid) = self.data.countries.resolve(&name) else {
                diagnostics.unmapped_volume_base += acc.volume_base;
                diagnostics.unmapped_countries.push(name);
                continue;
            };
            match merged.get_mut(&centroid.name) {
                Some((_, existing)) => existing.merge(acc),
                None => {
                    merged.insert(centroid.name.clone(), (centroid, acc));
                }
            }
        }

        if !diagnostics.unmapped_countries.is_empty() {
            warn!(
                countries = ?diagnostics.unmapped_countries,
                volume_base = diagnostics.unmapped_volume_base,
                "Dropped countries without a centroid"
            );
        }
        merged
    }

    fn score<'c>(
        &self,
        merged: BTreeMap<String, (&'c Centroid, CountryAccumulator)>,
        input: &AggregationInput<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Scored<'c>> {
        let estimates = input
            .on_chain
            .map(|data| distribute_on_chain(&self.data.chains, &data.chain_breakdown))
            .unwrap_or_default();

        merged
            .into_values()
            .map(|(centroid, acc)| {
                let volume_usd = acc.volume_base * input.base_price_usd;
                let blended = if input.on_chain.is_some() {
                    compute_blended_weights(volume_usd, &centroid.name, &estimates, &self.blend)
                } else {
                    None
                };
                let bias = match blended {
                    Some(shares) => {
                        diagnostics.blended_countries += 1;
                        shares
                    }
                    None => self.calibrator.country_weights(&centroid.name, input.calibration),
                };
                let score = volume_usd * bias.get(input.filter);
                diagnostics.total_score += score;
                Scored { centroid, acc, score }
            })
            .collect()
    }

    fn rescale(
        &self,
        scored: Vec<Scored<'_>>,
        input: &AggregationInput<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<CountryVolume> {
        let total_score = diagnostics.total_score;
        let target = input.verified.map(|v| v.for_filter(input.filter));
        diagnostics.target_volume = target;
        let target = target.unwrap_or(total_score);

        let mut countries: Vec<CountryVolume> = scored
            .into_iter()
            .map(|s| {
                let volume_usd = if total_score > 0.0 {
                    target * (s.score / total_score)
                } else {
                    0.0
                };
                let volume_base = if input.base_price_usd > 0.0 {
                    volume_usd / input.base_price_usd
                } else {
                    0.0
                };
                CountryVolume {
                    country: s.centroid.name.clone(),
                    iso2: s.centroid.iso2.clone(),
                    iso3: s.centroid.iso3.clone(),
                    lat: s.centroid.lat,
                    lng: s.centroid.lng,
                    volume_usd,
                    volume_base,
                    exchange_count: s.acc.exchange_count,
                    top_exchange: s.acc.top_exchange,
                    volume_normalized: 0.0,
                }
            })
            .collect();

        countries.sort_by(|a, b| {
            OrderedFloat(b.volume_usd)
                .cmp(&OrderedFloat(a.volume_usd))
                .then_with(|| a.country.cmp(&b.country))
        });

        let max = countries.first().map(|c| c.volume_usd).unwrap_or(0.0);
        let divisor = if max > 0.0 { max } else { 1.0 };
        for c in &mut countries {
            c.volume_normalized = c.volume_usd / divisor;
        }
        countries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ChainAmounts, LiveShares};
    use std::collections::HashMap;

    fn index_by_country(countries: &[CountryVolume]) -> HashMap<&str, &CountryVolume> {
        countries.iter().map(|c| (c.country.as_str(), c)).collect()
    }

    fn aggregator() -> Aggregator {
        let data = Arc::new(ReferenceData::builtin().unwrap());
        Aggregator::new(data, CalibrationParams::default(), BlendParams::default())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
    }

    fn sample_exchanges() -> Vec<Exchange> {
        vec![
            Exchange::new("binance", "Binance", Some("Cayman Islands"), 150_000.0).with_trust_score(10.0),
            Exchange::new("coinbase", "Coinbase Exchange", Some("United States"), 20_000.0).with_trust_score(10.0),
            Exchange::new("upbit", "Upbit", None, 12_000.0).with_trust_score(9.0),
            Exchange::new("bitflyer", "bitFlyer", Some("Japan"), 3_000.0).with_trust_score(8.0),
            Exchange::new("btcturk", "BtcTurk", Some("Turkey"), 4_000.0).with_trust_score(8.0),
            Exchange::new("mystery", "Mystery", None, 999.0).with_trust_score(2.0),
        ]
    }

    fn on_chain() -> LiveOnChainData {
        let chain_breakdown = [
            ("tron", 60e9, 0.5e9),
            ("ethereum", 50e9, 30e9),
            ("solana", 2e9, 8e9),
        ]
        .into_iter()
        .map(|(c, usdt, usdc)| (c.to_string(), ChainAmounts { usdt, usdc }))
        .collect();
        LiveOnChainData {
            usdt_market_cap: 140e9,
            usdc_market_cap: 60e9,
            dai_market_cap: 5e9,
            total_market_cap: 230e9,
            shares: LiveShares::new(140.0 / 230.0, 60.0 / 230.0, 5.0 / 230.0),
            chain_breakdown,
        }
    }

    fn assert_normalized(result: &AggregationResult) {
        assert!(result
            .countries
            .iter()
            .all(|c| (0.0..=1.0).contains(&c.volume_normalized)));
        if result.countries.iter().any(|c| c.volume_usd > 0.0) {
            assert_eq!(result.countries[0].volume_normalized, 1.0);
        }
    }

    #[test]
    fn test_binance_in_cayman_goes_to_profile_countries() {
        let agg = aggregator();
        let exchanges = vec![Exchange::new("binance", "Binance", Some("Cayman Islands"), 1000.0)];
        let result = agg.aggregate(AggregationInput::new(&exchanges, 60_000.0, StablecoinFilter::All));

        let profile = agg.reference_data().exchanges.profile_for("binance").unwrap();
        assert_eq!(result.country_count, profile.len());
        assert!(result.countries.iter().all(|c| c.country != "Cayman Islands"));
        assert_eq!(result.countries[0].volume_normalized, 1.0);

        // no verified data: volume_usd equals the raw score
        let by_name = index_by_country(&result.countries);
        for row in profile {
            let weight = agg.calibrator().country_weights(&row.country, None).all;
            let expected = 1000.0 * row.share * 60_000.0 * weight;
            assert!(close(by_name[row.country.as_str()].volume_usd, expected), "{}", row.country);
        }
    }

    #[test]
    fn test_verified_volume_fixes_global_total() {
        let agg = aggregator();
        let exchanges = sample_exchanges();
        let verified = VerifiedVolumes { usdt: 50e9, usdc: 20e9, dai: 2e9, total: 80e9 };

        for (filter, expected) in [
            (StablecoinFilter::Usdt, 50e9),
            (StablecoinFilter::Usdc, 20e9),
            (StablecoinFilter::Dai, 2e9),
            (StablecoinFilter::All, 80e9),
        ] {
            let input = AggregationInput::new(&exchanges, 60_000.0, filter)
                .with_on_chain(None)
                .with_verified(Some(&verified));
            let result = agg.aggregate(input);
            assert!(close(result.global_volume, expected), "{filter}: {}", result.global_volume);
            assert_eq!(result.diagnostics.target_volume, Some(expected));
            assert_normalized(&result);
        }
    }

    #[test]
    fn test_degrades_without_optional_inputs() {
        let agg = aggregator();
        let exchanges = sample_exchanges();
        let result = agg.aggregate(AggregationInput::new(&exchanges, 60_000.0, StablecoinFilter::Usdt));

        assert!(result.country_count > 0);
        assert!(result.global_volume > 0.0);
        assert_eq!(result.top_countries.len(), DEFAULT_TOP_COUNTRIES);
        assert_eq!(result.point_features.len(), result.country_count);
        assert_eq!(result.diagnostics.blended_countries, 0);
        assert!(result.countries.iter().all(|c| !c.iso2.is_empty() && !c.top_exchange.is_empty()));
        assert_normalized(&result);
    }

    #[test]
    fn test_exchange_without_country_is_excluded() {
        let agg = aggregator();
        let exchanges = vec![
            Exchange::new("mystery", "Mystery", None, 500.0).with_trust_score(4.0),
            Exchange::new("bitflyer", "bitFlyer", Some("Japan"), 10.0).with_trust_score(8.0),
        ];
        let result = agg.aggregate(AggregationInput::new(&exchanges, 100.0, StablecoinFilter::All));

        assert_eq!(result.country_count, 1);
        assert_eq!(result.countries[0].country, "Japan");
        assert_eq!(result.countries[0].top_exchange, "bitFlyer");
        assert_eq!(result.diagnostics.attribution.exchanges_dropped, 1);
        assert_eq!(result.diagnostics.attribution.skipped_volume, 500.0);
    }

    #[test]
    fn test_empty_input_is_a_valid_empty_result() {
        let agg = aggregator();
        let verified = VerifiedVolumes { usdt: 1.0, usdc: 1.0, dai: 1.0, total: 3.0 };
        let input = AggregationInput::new(&[], 60_000.0, StablecoinFilter::All).with_verified(Some(&verified));
        let result = agg.aggregate(input);

        assert!(result.countries.is_empty());
        assert!(result.top_countries.is_empty());
        assert_eq!(result.global_volume, 0.0);
        assert_eq!(result.country_count, 0);
        assert!(result.point_features.is_empty());
    }

    #[test]
    fn test_zero_price_yields_zero_volumes() {
        let agg = aggregator();
        let exchanges = sample_exchanges();
        let result = agg.aggregate(AggregationInput::new(&exchanges, 0.0, StablecoinFilter::All));

        assert!(result.country_count > 0);
        assert!(result.countries.iter().all(|c| c.volume_usd == 0.0 && c.volume_base == 0.0));
        assert!(result.countries.iter().all(|c| c.volume_normalized == 0.0));
    }

    #[test]
    fn test_on_chain_blend_is_used_when_available() {
        let agg = aggregator();
        let exchanges = sample_exchanges();
        let data = on_chain();
        let calibration = agg.calibrator().calibrate(data.shares);
        let input = AggregationInput::new(&exchanges, 60_000.0, StablecoinFilter::All)
            .with_on_chain(Some(&data))
            .with_calibration(Some(&calibration));
        let result = agg.aggregate(input);

        assert!(result.diagnostics.blended_countries > 0);
        assert!(result.diagnostics.blended_countries <= result.country_count);
        assert!(result.global_volume > 0.0);
        assert_normalized(&result);
    }

    #[test]
    fn test_aliases_merge_into_one_country() {
        let agg = aggregator();
        let exchanges = vec![
            Exchange::new("a", "Alpha", Some("USA"), 10.0).with_trust_score(5.0),
            Exchange::new("b", "Beta", Some("United States"), 30.0).with_trust_score(5.0),
        ];
        let result = agg.aggregate(AggregationInput::new(&exchanges, 1.0, StablecoinFilter::All));

        assert_eq!(result.country_count, 1);
        let us = &result.countries[0];
        assert_eq!(us.country, "United States");
        assert_eq!(us.exchange_count, 2);
        assert_eq!(us.top_exchange, "Beta");
    }

    #[test]
    fn test_unmapped_country_is_reported() {
        let agg = aggregator();
        let exchanges = vec![Exchange::new("x", "X", Some("Atlantis"), 10.0).with_trust_score(5.0)];
        let result = agg.aggregate(AggregationInput::new(&exchanges, 1.0, StablecoinFilter::All));

        assert!(result.countries.is_empty());
        assert_eq!(result.diagnostics.unmapped_countries, vec!["Atlantis".to_string()]);
        assert_eq!(result.diagnostics.unmapped_volume_base, 10.0);
    }

    #[test]
    fn test_volume_base_follows_price() {
        let agg = aggregator();
        let exchanges = vec![Exchange::new("bitflyer", "bitFlyer", Some("Japan"), 10.0).with_trust_score(8.0)];
        let verified = VerifiedVolumes { usdt: 0.0, usdc: 0.0, dai: 0.0, total: 5_000.0 };
        let input = AggregationInput::new(&exchanges, 250.0, StablecoinFilter::All).with_verified(Some(&verified));
        let result = agg.aggregate(input);
        assert!(close(result.countries[0].volume_usd, 5_000.0));
        assert!(close(result.countries[0].volume_base, 20.0));
    }

    #[test]
    fn test_top_countries_is_configurable() {
        let data = Arc::new(ReferenceData::builtin().unwrap());
        let agg = Aggregator::new(data, CalibrationParams::default(), BlendParams::default()).with_top_countries(3);
        let exchanges = sample_exchanges();
        let result = agg.aggregate(AggregationInput::new(&exchanges, 1.0, StablecoinFilter::All));
        assert_eq!(result.top_countries.len(), 3);
        assert_eq!(result.top_countries[..], result.countries[..3]);
    }
}
