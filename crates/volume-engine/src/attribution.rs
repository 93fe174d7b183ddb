//! Exchange volume attribution to countries.
//!
//! Multinational exchanges are frequently incorporated in a jurisdiction
//! their users do not live in. Volume of an exchange with a known user
//! profile is split over that profile; volume of an unprofiled exchange
//! registered in a tax haven is split over the default global distribution;
//! everything else stays in the registered country.

use common::Exchange;
use reference_data::{ExchangeTables, UserDistribution};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Running totals for one country during a single aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountryAccumulator {
    pub volume_base: f64,
    pub exchange_count: u32,
    pub top_exchange: String,
    pub top_exchange_volume: f64,
}

impl CountryAccumulator {
    fn new(exchange: &str, volume: f64) -> Self {
        Self {
            volume_base: volume,
            exchange_count: 1,
            top_exchange: exchange.to_string(),
            top_exchange_volume: volume,
        }
    }

    /// Record one contribution; the top exchange changes only on strictly
    /// greater volume
    pub fn add(&mut self, exchange: &str, volume: f64) {
        self.volume_base += volume;
        self.exchange_count += 1;
        if volume > self.top_exchange_volume {
            self.top_exchange = exchange.to_string();
            self.top_exchange_volume = volume;
        }
    }

    /// Fold another accumulator for the same country into this one
    pub fn merge(&mut self, other: CountryAccumulator) {
        self.volume_base += other.volume_base;
        self.exchange_count += other.exchange_count;
        if other.top_exchange_volume > self.top_exchange_volume {
            self.top_exchange = other.top_exchange;
            self.top_exchange_volume = other.top_exchange_volume;
        }
    }
}

/// Volume bookkeeping of one attribution pass, in base units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionStats {
    pub exchanges_seen: usize,
    /// Unrated exchanges reporting no volume
    pub exchanges_skipped_no_data: usize,
    /// Exchanges with no resolvable country
    pub exchanges_dropped: usize,
    /// Volume of every exchange that had a country
    pub raw_volume: f64,
    pub redistributed_volume: f64,
    pub direct_volume: f64,
    /// Volume lost to exchanges with no resolvable country
    pub skipped_volume: f64,
}

/// Result of the attribution pass
#[derive(Debug, Clone, Default)]
pub struct Attribution {
    pub countries: BTreeMap<String, CountryAccumulator>,
    pub stats: AttributionStats,
}

impl Attribution {
    fn credit(&mut self, country: &str, exchange: &str, volume: f64) {
        match self.countries.get_mut(country) {
            Some(acc) => acc.add(exchange, volume),
            None => {
                self.countries
                    .insert(country.to_string(), CountryAccumulator::new(exchange, volume));
            }
        }
    }

    fn redistribute(&mut self, rows: &[UserDistribution], exchange: &str, volume: f64) {
        for row in rows {
            self.credit(&row.country, exchange, volume * row.share);
        }
        self.stats.redistributed_volume += volume;
    }
}

/// Registered country, or the static override when the listing has none
fn resolve_country<'a>(tables: &'a ExchangeTables, exchange: &'a Exchange) -> Option<&'a str> {
    exchange
        .registered_country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .or_else(|| tables.country_override(&exchange.id))
}

/// Attribute every exchange's volume to the countries its users are in
pub fn attribute_exchanges(tables: &ExchangeTables, exchanges: &[Exchange]) -> Attribution {
    let mut attribution = Attribution::default();

    for exchange in exchanges {
        attribution.stats.exchanges_seen += 1;
        if !exchange.has_data() {
            attribution.stats.exchanges_skipped_no_data += 1;
            continue;
        }

        let volume = exchange.trade_volume_base;
        let Some(country) = resolve_country(tables, exchange) else {
            debug!(exchange = %exchange.id, volume, "No country for exchange, dropping volume");
            attribution.stats.exchanges_dropped += 1;
            attribution.stats.skipped_volume += volume;
            continue;
        };
        attribution.stats.raw_volume += volume;

        if let Some(profile) = tables.profile_for(&exchange.id) {
            attribution.redistribute(profile, &exchange.name, volume);
        } else if tables.is_tax_haven(country) {
            attribution.redistribute(tables.default_distribution(), &exchange.name, volume);
        } else {
            attribution.credit(country, &exchange.name, volume);
            attribution.stats.direct_volume += volume;
        }
    }

    let stats = &attribution.stats;
    info!(
        exchanges = stats.exchanges_seen,
        dropped = stats.exchanges_dropped,
        raw = stats.raw_volume,
        redistributed = stats.redistributed_volume,
        direct = stats.direct_volume,
        skipped = stats.skipped_volume,
        countries = attribution.countries.len(),
        "Attributed exchange volume"
    );

    attribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use reference_data::ReferenceData;

    fn tables() -> ExchangeTables {
        ReferenceData::builtin().unwrap().exchanges
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * a.abs().max(1.0)
    }

    #[test]
    fn test_same_country_exchanges_accumulate() {
        let exchanges = vec![
            Exchange::new("bitpanda_de", "Bitpanda DE", Some("Germany"), 100.0).with_trust_score(8.0),
            Exchange::new("boerse", "Boerse Stuttgart", Some("Germany"), 50.0).with_trust_score(7.0),
        ];
        let result = attribute_exchanges(&tables(), &exchanges);

        assert_eq!(result.countries.len(), 1);
        let germany = &result.countries["Germany"];
        assert_eq!(germany.exchange_count, 2);
        assert_eq!(germany.top_exchange, "Bitpanda DE");
        assert_eq!(germany.top_exchange_volume, 100.0);
        assert_eq!(germany.volume_base, 150.0);
        assert_eq!(result.stats.direct_volume, 150.0);
    }

    #[test]
    fn test_top_exchange_ties_keep_first() {
        let exchanges = vec![
            Exchange::new("a", "First", Some("Germany"), 10.0),
            Exchange::new("b", "Second", Some("Germany"), 10.0),
        ];
        let result = attribute_exchanges(&tables(), &exchanges);
        assert_eq!(result.countries["Germany"].top_exchange, "First");
    }

    #[test]
    fn test_profiled_exchange_is_redistributed() {
        let tables = tables();
        let exchanges = vec![Exchange::new("binance", "Binance", Some("Cayman Islands"), 1000.0)];
        let result = attribute_exchanges(&tables, &exchanges);

        let profile = tables.profile_for("binance").unwrap();
        assert!(!result.countries.contains_key("Cayman Islands"));
        assert_eq!(result.countries.len(), profile.len());

        let share_sum: f64 = profile.iter().map(|r| r.share).sum();
        let attributed: f64 = result.countries.values().map(|a| a.volume_base).sum();
        assert!(close(attributed, 1000.0 * share_sum));
        assert_eq!(result.stats.redistributed_volume, 1000.0);
        assert!(result.countries.values().all(|a| a.top_exchange == "Binance"));
    }

    #[test]
    fn test_tax_haven_without_profile_uses_default_distribution() {
        let tables = tables();
        let exchanges = vec![Exchange::new("island_ex", "Island", Some("Seychelles"), 200.0)];
        let result = attribute_exchanges(&tables, &exchanges);

        assert!(!result.countries.contains_key("Seychelles"));
        assert_eq!(result.countries.len(), tables.default_distribution().len());
        let attributed: f64 = result.countries.values().map(|a| a.volume_base).sum();
        assert!(close(attributed, 200.0));
    }

    #[test]
    fn test_exchange_without_country_is_dropped() {
        let exchanges = vec![
            Exchange::new("nowhere", "Nowhere", None, 42.0).with_trust_score(5.0),
            Exchange::new("blank", "Blank", Some("  "), 8.0).with_trust_score(5.0),
        ];
        let result = attribute_exchanges(&tables(), &exchanges);
        assert!(result.countries.is_empty());
        assert_eq!(result.stats.exchanges_dropped, 2);
        assert_eq!(result.stats.skipped_volume, 50.0);
        assert_eq!(result.stats.raw_volume, 0.0);
    }

    #[test]
    fn test_country_override_applies_when_unregistered() {
        let exchanges = vec![Exchange::new("upbit", "Upbit", None, 300.0)];
        let result = attribute_exchanges(&tables(), &exchanges);
        assert_eq!(result.countries["South Korea"].volume_base, 300.0);
    }

    #[test]
    fn test_unrated_zero_volume_exchange_is_skipped() {
        let exchanges = vec![
            Exchange::new("ghost", "Ghost", Some("Germany"), 0.0),
            Exchange::new("rated", "Rated", Some("France"), 0.0).with_trust_score(3.0),
        ];
        let result = attribute_exchanges(&tables(), &exchanges);
        assert_eq!(result.stats.exchanges_skipped_no_data, 1);
        assert!(!result.countries.contains_key("Germany"));
        // a rated exchange still registers its country, even with no volume
        assert_eq!(result.countries["France"].top_exchange, "Rated");
    }

    #[test]
    fn test_merge_keeps_larger_top() {
        let mut a = CountryAccumulator::new("A", 5.0);
        a.add("B", 7.0);
        let b = CountryAccumulator::new("C", 9.0);
        a.merge(b);
        assert_eq!(a.exchange_count, 3);
        assert_eq!(a.volume_base, 21.0);
        assert_eq!(a.top_exchange, "C");
    }
}
