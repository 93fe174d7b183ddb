//! Stablecoin regulatory status by country.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ReferenceDataError, Result};

pub(crate) const DOCUMENT: &str = "regulations.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulationStatus {
    Regulated,
    Partial,
    Restricted,
    Unclear,
}

impl RegulationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Regulated => "Regulated",
            Self::Partial => "Partial",
            Self::Restricted => "Restricted",
            Self::Unclear => "Unclear",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRegulation {
    pub country: String,
    pub iso2: String,
    pub status: RegulationStatus,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_law: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stablecoins_allowed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Count of entries per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationStats {
    pub total: usize,
    pub regulated: usize,
    pub partial: usize,
    pub restricted: usize,
    pub unclear: usize,
}

#[derive(Debug, Deserialize)]
struct RegulationDocument {
    regulations: Vec<CountryRegulation>,
}

#[derive(Debug, Clone)]
pub struct RegulationTable {
    entries: Vec<CountryRegulation>,
    by_iso2: HashMap<String, usize>,
}

impl RegulationTable {
    pub(crate) fn parse(yaml: &str) -> Result<Self> {
        let doc: RegulationDocument = serde_yaml::from_str(yaml)
            .map_err(|source| ReferenceDataError::Parse { document: DOCUMENT, source })?;

        let mut by_iso2 = HashMap::new();
        for (i, entry) in doc.regulations.iter().enumerate() {
            if entry.iso2.len() != 2 {
                return Err(ReferenceDataError::invalid(
                    DOCUMENT,
                    format!("{}: iso2 '{}' is not a two-letter code", entry.country, entry.iso2),
                ));
            }
            if by_iso2.insert(entry.iso2.to_uppercase(), i).is_some() {
                return Err(ReferenceDataError::invalid(
                    DOCUMENT,
                    format!("duplicate entry for {}", entry.iso2),
                ));
            }
        }

        Ok(Self {
            entries: doc.regulations,
            by_iso2,
        })
    }

    /// Case-insensitive lookup by ISO 3166-1 alpha-2 code
    pub fn by_iso2(&self, iso2: &str) -> Option<&CountryRegulation> {
        self.by_iso2
            .get(&iso2.trim().to_uppercase())
            .map(|&i| &self.entries[i])
    }

    pub fn all(&self) -> &[CountryRegulation] {
        &self.entries
    }

    pub fn stats(&self) -> RegulationStats {
        let mut stats = RegulationStats {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            match entry.status {
                RegulationStatus::Regulated => stats.regulated += 1,
                RegulationStatus::Partial => stats.partial += 1,
                RegulationStatus::Restricted => stats.restricted += 1,
                RegulationStatus::Unclear => stats.unclear += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
regulations:
  - country: Germany
    iso2: DE
    status: regulated
    summary: MiCA in effect.
    key_law: MiCA (2024)
    stablecoins_allowed: [USDC, EURC]
  - country: China
    iso2: CN
    status: restricted
    summary: Banned.
  - country: Brazil
    iso2: BR
    status: partial
    summary: Framework in progress.
"#;

    #[test]
    fn test_lookup_and_stats() {
        let table = RegulationTable::parse(SAMPLE).unwrap();
        let de = table.by_iso2("de").unwrap();
        assert_eq!(de.status, RegulationStatus::Regulated);
        assert_eq!(de.stablecoins_allowed.as_deref(), Some(&["USDC".to_string(), "EURC".to_string()][..]));
        assert!(table.by_iso2("XX").is_none());

        let stats = table.stats();
        assert_eq!(
            stats,
            RegulationStats { total: 3, regulated: 1, partial: 1, restricted: 1, unclear: 0 }
        );
    }

    #[test]
    fn test_duplicate_iso_rejected() {
        let yaml = SAMPLE.replace("iso2: BR", "iso2: de");
        assert!(RegulationTable::parse(&yaml).is_err());
    }
}
