//! Exchange user-base profiles, tax-haven jurisdictions and registered
//! country overrides.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{ReferenceDataError, Result};

pub(crate) const DOCUMENT: &str = "exchange_profiles.yaml";

/// Share of an exchange's users located in one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDistribution {
    pub country: String,
    pub share: f64,
}

#[derive(Debug, Deserialize)]
struct ExchangeDocument {
    profiles: HashMap<String, Vec<UserDistribution>>,
    exchange_profiles: HashMap<String, String>,
    tax_havens: Vec<String>,
    default_distribution: Vec<UserDistribution>,
    #[serde(default)]
    exchange_countries: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ExchangeTables {
    profiles: HashMap<String, Vec<UserDistribution>>,
    exchange_profiles: HashMap<String, String>,
    tax_havens: HashSet<String>,
    default_distribution: Vec<UserDistribution>,
    exchange_countries: HashMap<String, String>,
}

impl ExchangeTables {
    pub(crate) fn parse(yaml: &str) -> Result<Self> {
        let doc: ExchangeDocument = serde_yaml::from_str(yaml)
            .map_err(|source| ReferenceDataError::Parse { document: DOCUMENT, source })?;

        for (exchange_id, profile) in &doc.exchange_profiles {
            if !doc.profiles.contains_key(profile) {
                return Err(ReferenceDataError::invalid(
                    DOCUMENT,
                    format!("exchange '{}' refers to unknown profile '{}'", exchange_id, profile),
                ));
            }
        }

        let all_rows = doc
            .profiles
            .values()
            .flatten()
            .chain(doc.default_distribution.iter());
        for row in all_rows {
            if row.share < 0.0 || !row.share.is_finite() {
                return Err(ReferenceDataError::invalid(
                    DOCUMENT,
                    format!("share for '{}' must be a non-negative number, got {}", row.country, row.share),
                ));
            }
        }

        Ok(Self {
            profiles: doc.profiles,
            exchange_profiles: doc.exchange_profiles,
            tax_havens: doc.tax_havens.into_iter().collect(),
            default_distribution: doc.default_distribution,
            exchange_countries: doc.exchange_countries,
        })
    }

    /// User distribution for an exchange id, if it has a known profile
    pub fn profile_for(&self, exchange_id: &str) -> Option<&[UserDistribution]> {
        self.exchange_profiles
            .get(exchange_id)
            .and_then(|key| self.profiles.get(key))
            .map(Vec::as_slice)
    }

    pub fn is_tax_haven(&self, country: &str) -> bool {
        self.tax_havens.contains(country)
    }

    /// Distribution applied to tax-haven exchanges without a profile
    pub fn default_distribution(&self) -> &[UserDistribution] {
        &self.default_distribution
    }

    /// Registered country for exchanges whose listing omits it
    pub fn country_override(&self, exchange_id: &str) -> Option<&str> {
        self.exchange_countries.get(exchange_id).map(String::as_str)
    }

    /// Named profiles including the default distribution, for sanity checks
    pub fn distributions(&self) -> impl Iterator<Item = (&str, &[UserDistribution])> {
        self.profiles
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
            .chain(std::iter::once(("default", self.default_distribution.as_slice())))
    }

    /// Every country referenced by a profile, the tax-haven set or the overrides
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.distributions()
            .flat_map(|(_, rows)| rows.iter().map(|r| r.country.as_str()))
            .chain(self.tax_havens.iter().map(String::as_str))
            .chain(self.exchange_countries.values().map(String::as_str))
    }
}
