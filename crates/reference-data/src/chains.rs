//! How each chain's stablecoin supply is used across regions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ReferenceDataError, Result};

pub(crate) const DOCUMENT: &str = "chain_distributions.yaml";

/// A region's share of one chain's usage, split evenly over `countries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionShare {
    pub region: String,
    pub countries: Vec<String>,
    pub share: f64,
}

#[derive(Debug, Clone)]
pub struct ChainTables {
    chains: HashMap<String, Vec<RegionShare>>,
}

impl ChainTables {
    pub(crate) fn parse(yaml: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<RegionShare>> = serde_yaml::from_str(yaml)
            .map_err(|source| ReferenceDataError::Parse { document: DOCUMENT, source })?;

        for (chain, regions) in &raw {
            for region in regions {
                if region.countries.is_empty() {
                    return Err(ReferenceDataError::invalid(
                        DOCUMENT,
                        format!("{}: region '{}' lists no countries", chain, region.region),
                    ));
                }
                if region.share < 0.0 || !region.share.is_finite() {
                    return Err(ReferenceDataError::invalid(
                        DOCUMENT,
                        format!("{}: region '{}' has invalid share {}", chain, region.region, region.share),
                    ));
                }
            }
        }

        let chains = raw
            .into_iter()
            .map(|(chain, regions)| (chain.to_lowercase(), regions))
            .collect();
        Ok(Self { chains })
    }

    /// Region table for a chain (case-insensitive)
    pub fn distribution(&self, chain: &str) -> Option<&[RegionShare]> {
        self.chains.get(&chain.to_lowercase()).map(Vec::as_slice)
    }

    pub fn chains(&self) -> impl Iterator<Item = (&str, &[RegionShare])> {
        self.chains.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.chains
            .values()
            .flatten()
            .flat_map(|r| r.countries.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let yaml = r#"
Tron:
  - { region: Asia, share: 1.0, countries: [Vietnam, Thailand] }
"#;
        let tables = ChainTables::parse(yaml).unwrap();
        assert_eq!(tables.distribution("tron").map(|d| d.len()), Some(1));
        assert!(tables.distribution("TRON").is_some());
        assert!(tables.distribution("polygon").is_none());
    }

    #[test]
    fn test_empty_region_rejected() {
        let yaml = "tron:\n  - { region: Empty, share: 1.0, countries: [] }\n";
        assert!(ChainTables::parse(yaml).is_err());
    }
}
