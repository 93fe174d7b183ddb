//! Static reference tables for stablemap
//!
//! The estimation pipeline leans on a handful of hand-curated tables:
//!
//! - [`weights`] - per-country and per-region stablecoin share priors
//! - [`exchanges`] - user distributions of multinational exchanges, tax-haven
//!   jurisdictions and registered-country overrides
//! - [`chains`] - regional usage of each chain's stablecoin supply
//! - [`countries`] - map centroids with name aliases
//! - [`regulation`] - regulatory status by country
//!
//! The tables ship as YAML documents embedded in the binary and are parsed
//! once at startup into a [`ReferenceData`], which is shared read-only
//! behind an `Arc`. A directory can be supplied to replace any of the
//! documents without rebuilding.
//!
//! ```ignore
//! let data = reference_data::ReferenceData::builtin()?;
//! let germany = data.countries.resolve("Germany");
//! ```

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub mod chains;
pub mod countries;
pub mod error;
pub mod exchanges;
pub mod regulation;
pub mod weights;

pub use chains::{ChainTables, RegionShare};
pub use countries::{Centroid, CountryTable};
pub use error::{ReferenceDataError, Result};
pub use exchanges::{ExchangeTables, UserDistribution};
pub use regulation::{CountryRegulation, RegulationStats, RegulationStatus, RegulationTable};
pub use weights::{PartialShares, WeightTables};

const WEIGHTS_YAML: &str = include_str!("../data/stablecoin_weights.yaml");
const EXCHANGES_YAML: &str = include_str!("../data/exchange_profiles.yaml");
const CHAINS_YAML: &str = include_str!("../data/chain_distributions.yaml");
const COUNTRIES_YAML: &str = include_str!("../data/countries.yaml");
const REGULATIONS_YAML: &str = include_str!("../data/regulations.yaml");

/// Tolerance when checking that a distribution sums to one
const SUM_TOLERANCE: f64 = 0.005;

/// All reference tables, loaded together
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub weights: WeightTables,
    pub exchanges: ExchangeTables,
    pub chains: ChainTables,
    pub countries: CountryTable,
    pub regulations: RegulationTable,
}

impl ReferenceData {
    /// Parse the embedded documents
    pub fn builtin() -> Result<Self> {
        Self::from_documents(
            WEIGHTS_YAML,
            EXCHANGES_YAML,
            CHAINS_YAML,
            COUNTRIES_YAML,
            REGULATIONS_YAML,
        )
    }

    /// Load documents from `dir`, falling back to the embedded copy for
    /// every file that is not present there
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        info!(?dir, "Loading reference data overrides");

        let weights = read_or_builtin(dir, weights::DOCUMENT, WEIGHTS_YAML)?;
        let exchanges = read_or_builtin(dir, exchanges::DOCUMENT, EXCHANGES_YAML)?;
        let chains = read_or_builtin(dir, chains::DOCUMENT, CHAINS_YAML)?;
        let countries = read_or_builtin(dir, countries::DOCUMENT, COUNTRIES_YAML)?;
        let regulations = read_or_builtin(dir, regulation::DOCUMENT, REGULATIONS_YAML)?;

        Self::from_documents(&weights, &exchanges, &chains, &countries, &regulations)
    }

    fn from_documents(
        weights: &str,
        exchanges: &str,
        chains: &str,
        countries: &str,
        regulations: &str,
    ) -> Result<Self> {
        let data = Self {
            weights: WeightTables::parse(weights)?,
            exchanges: ExchangeTables::parse(exchanges)?,
            chains: ChainTables::parse(chains)?,
            countries: CountryTable::parse(countries)?,
            regulations: RegulationTable::parse(regulations)?,
        };

        let problems = data.check();
        for problem in &problems {
            warn!("{}", problem);
        }
        debug!(
            countries = data.countries.len(),
            regulations = data.regulations.all().len(),
            problems = problems.len(),
            "Reference data loaded"
        );
        Ok(data)
    }

    /// Consistency problems that do not prevent loading: distributions
    /// that do not sum to one and countries with no centroid
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (name, rows) in self.exchanges.distributions() {
            let sum: f64 = rows.iter().map(|r| r.share).sum();
            if (sum - 1.0).abs() > SUM_TOLERANCE {
                problems.push(format!("exchange profile '{}' sums to {:.4}", name, sum));
            }
        }

        for (chain, regions) in self.chains.chains() {
            let sum: f64 = regions.iter().map(|r| r.share).sum();
            if (sum - 1.0).abs() > SUM_TOLERANCE {
                problems.push(format!("chain '{}' sums to {:.4}", chain, sum));
            }
        }

        let mut missing: Vec<&str> = self
            .weights
            .countries()
            .chain(self.exchanges.countries())
            .chain(self.chains.countries())
            .filter(|c| self.countries.resolve(c).is_none())
            .collect();
        missing.sort_unstable();
        missing.dedup();
        for country in missing {
            problems.push(format!("'{}' has no centroid", country));
        }

        problems
    }
}

fn read_or_builtin(dir: &Path, file: &'static str, builtin: &str) -> Result<String> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(builtin.to_string());
    }
    debug!(?path, "Using reference document override");
    fs::read_to_string(&path).map_err(|source| ReferenceDataError::Io { path, source })
}
