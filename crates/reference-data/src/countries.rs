//! Country centroids and name resolution.
//!
//! Sources report countries under varying spellings ("USA", "Korea",
//! "Türkiye"). Every lookup goes through [`CountryTable::resolve`], which
//! matches the canonical name, any alias or the ISO codes, ignoring case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ReferenceDataError, Result};

pub(crate) const DOCUMENT: &str = "countries.yaml";

/// Representative map point for a country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub name: String,
    pub iso2: String,
    pub iso3: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CountriesDocument {
    countries: Vec<Centroid>,
}

#[derive(Debug, Clone)]
pub struct CountryTable {
    countries: Vec<Centroid>,
    index: HashMap<String, usize>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl CountryTable {
    pub(crate) fn parse(yaml: &str) -> Result<Self> {
        let doc: CountriesDocument = serde_yaml::from_str(yaml)
            .map_err(|source| ReferenceDataError::Parse { document: DOCUMENT, source })?;

        let mut index = HashMap::new();
        for (i, c) in doc.countries.iter().enumerate() {
            if !(-90.0..=90.0).contains(&c.lat) || !(-180.0..=180.0).contains(&c.lng) {
                return Err(ReferenceDataError::invalid(
                    DOCUMENT,
                    format!("{}: coordinates out of range ({}, {})", c.name, c.lat, c.lng),
                ));
            }
            let names = std::iter::once(&c.name)
                .chain(c.aliases.iter())
                .chain([&c.iso2, &c.iso3]);
            for name in names {
                if let Some(prev) = index.insert(key(name), i) {
                    if prev != i {
                        return Err(ReferenceDataError::invalid(
                            DOCUMENT,
                            format!(
                                "'{}' maps to both {} and {}",
                                name, doc.countries[prev].name, c.name
                            ),
                        ));
                    }
                }
            }
        }

        Ok(Self {
            countries: doc.countries,
            index,
        })
    }

    /// Resolve a country name, alias or ISO code to its centroid
    pub fn resolve(&self, name: &str) -> Option<&Centroid> {
        self.index.get(&key(name)).map(|&i| &self.countries[i])
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Centroid> {
        self.countries.iter()
    }
}
