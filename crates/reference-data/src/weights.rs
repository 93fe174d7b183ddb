//! Static stablecoin share priors per country and region.

use common::StablecoinShares;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{ReferenceDataError, Result};

pub(crate) const DOCUMENT: &str = "stablecoin_weights.yaml";

/// Country override where some fields may be omitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PartialShares {
    #[serde(default)]
    pub usdt: Option<f64>,
    #[serde(default)]
    pub usdc: Option<f64>,
    #[serde(default)]
    pub dai: Option<f64>,
    #[serde(default)]
    pub all: Option<f64>,
}

impl PartialShares {
    /// All four fields present
    pub fn as_complete(&self) -> Option<StablecoinShares> {
        Some(StablecoinShares::new(self.usdt?, self.usdc?, self.dai?, self.all?))
    }

    /// Overlay the present fields on top of `base`
    pub fn merge_onto(&self, base: StablecoinShares) -> StablecoinShares {
        StablecoinShares {
            usdt: self.usdt.unwrap_or(base.usdt),
            usdc: self.usdc.unwrap_or(base.usdc),
            dai: self.dai.unwrap_or(base.dai),
            all: self.all.unwrap_or(base.all),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeightsDocument {
    global_default: StablecoinShares,
    regions: HashMap<String, StablecoinShares>,
    country_regions: HashMap<String, Vec<String>>,
    #[serde(default)]
    overrides: HashMap<String, PartialShares>,
}

/// Lookup tables behind country weight resolution
#[derive(Debug, Clone)]
pub struct WeightTables {
    global_default: StablecoinShares,
    regions: HashMap<String, StablecoinShares>,
    country_region: HashMap<String, String>,
    overrides: HashMap<String, PartialShares>,
}

impl WeightTables {
    pub(crate) fn parse(yaml: &str) -> Result<Self> {
        let doc: WeightsDocument = serde_yaml::from_str(yaml)
            .map_err(|source| ReferenceDataError::Parse { document: DOCUMENT, source })?;

        let mut country_region = HashMap::new();
        for (region, countries) in doc.country_regions {
            if !doc.regions.contains_key(&region) {
                return Err(ReferenceDataError::invalid(
                    DOCUMENT,
                    format!("country_regions refers to unknown region '{}'", region),
                ));
            }
            for country in countries {
                if let Some(previous) = country_region.insert(country.clone(), region.clone()) {
                    return Err(ReferenceDataError::invalid(
                        DOCUMENT,
                        format!("'{}' is listed under both '{}' and '{}'", country, previous, region),
                    ));
                }
            }
        }

        Ok(Self {
            global_default: doc.global_default,
            regions: doc.regions,
            country_region,
            overrides: doc.overrides,
        })
    }

    /// Fallback for countries with no override and no region
    pub fn global_default(&self) -> StablecoinShares {
        self.global_default
    }

    pub fn region_of(&self, country: &str) -> Option<&str> {
        self.country_region.get(country).map(String::as_str)
    }

    pub fn region_default(&self, region: &str) -> Option<StablecoinShares> {
        self.regions.get(region).copied()
    }

    pub fn override_for(&self, country: &str) -> Option<&PartialShares> {
        self.overrides.get(country)
    }

    /// Every country named by the region map or the override table
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.country_region
            .keys()
            .chain(self.overrides.keys())
            .map(String::as_str)
    }
}
