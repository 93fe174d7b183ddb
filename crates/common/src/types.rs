//! Common types used across stablemap
//!
//! This module provides the domain types that flow between the data
//! sources, the estimation engine and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A spot exchange as reported by the exchange list source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    /// Source identifier, e.g. `binance`
    pub id: String,
    /// Display name
    pub name: String,
    /// Country of registration, if the source knows it
    #[serde(default)]
    pub registered_country: Option<String>,
    /// 24h trade volume denominated in the base asset
    #[serde(default)]
    pub trade_volume_base: f64,
    /// Source trust score, `None` when the exchange is unrated
    #[serde(default)]
    pub trust_score: Option<f64>,
}

impl Exchange {
    /// Create an exchange with no trust score
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        registered_country: Option<&str>,
        trade_volume_base: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            registered_country: registered_country.map(str::to_string),
            trade_volume_base,
            trust_score: None,
        }
    }

    /// Set the trust score
    pub fn with_trust_score(mut self, score: f64) -> Self {
        self.trust_score = Some(score);
        self
    }

    /// An unrated exchange with zero volume carries no usable signal
    pub fn has_data(&self) -> bool {
        self.trust_score.is_some() || self.trade_volume_base != 0.0
    }
}

/// Which stablecoin the estimate is computed for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StablecoinFilter {
    /// All stablecoins combined
    #[default]
    All,
    /// Tether
    Usdt,
    /// USD Coin
    Usdc,
    /// Dai
    Dai,
}

impl StablecoinFilter {
    /// Every filter value, in display order
    pub const VALUES: [StablecoinFilter; 4] = [Self::All, Self::Usdt, Self::Usdc, Self::Dai];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Usdt => "usdt",
            Self::Usdc => "usdc",
            Self::Dai => "dai",
        }
    }
}

impl fmt::Display for StablecoinFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StablecoinFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "usdt" => Ok(Self::Usdt),
            "usdc" => Ok(Self::Usdc),
            "dai" => Ok(Self::Dai),
            other => Err(Error::invalid_input(format!(
                "unknown stablecoin filter '{}', expected one of: all, usdt, usdc, dai",
                other
            ))),
        }
    }
}

/// Fraction of a country's spot volume settled in each stablecoin.
///
/// `all` covers USDT, USDC, DAI and every other stablecoin, so it is never
/// below `usdt + usdc + dai`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StablecoinShares {
    pub usdt: f64,
    pub usdc: f64,
    pub dai: f64,
    pub all: f64,
}

impl StablecoinShares {
    pub const fn new(usdt: f64, usdc: f64, dai: f64, all: f64) -> Self {
        Self { usdt, usdc, dai, all }
    }

    /// Share for the given filter
    pub fn get(&self, filter: StablecoinFilter) -> f64 {
        match filter {
            StablecoinFilter::All => self.all,
            StablecoinFilter::Usdt => self.usdt,
            StablecoinFilter::Usdc => self.usdc,
            StablecoinFilter::Dai => self.dai,
        }
    }
}

/// Global market share of the three tracked stablecoins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveShares {
    pub usdt: f64,
    pub usdc: f64,
    pub dai: f64,
}

impl LiveShares {
    pub const fn new(usdt: f64, usdc: f64, dai: f64) -> Self {
        Self { usdt, usdc, dai }
    }
}

/// Circulating USDT and USDC on one chain, in USD
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainAmounts {
    pub usdt: f64,
    pub usdc: f64,
}

/// Per-chain circulating supply keyed by lowercase chain name (`tron`, `ethereum`, ...)
pub type ChainBreakdown = BTreeMap<String, ChainAmounts>;

/// Live on-chain supply snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveOnChainData {
    pub usdt_market_cap: f64,
    pub usdc_market_cap: f64,
    pub dai_market_cap: f64,
    /// Market cap of every pegged asset, not only the three tracked ones
    pub total_market_cap: f64,
    pub shares: LiveShares,
    pub chain_breakdown: ChainBreakdown,
}

/// Externally reported 24h stablecoin trading volume, in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerifiedVolumes {
    pub usdt: f64,
    pub usdc: f64,
    pub dai: f64,
    pub total: f64,
}

impl VerifiedVolumes {
    /// Volume for the given filter; `All` maps to `total`
    pub fn for_filter(&self, filter: StablecoinFilter) -> f64 {
        match filter {
            StablecoinFilter::All => self.total,
            StablecoinFilter::Usdt => self.usdt,
            StablecoinFilter::Usdc => self.usdc,
            StablecoinFilter::Dai => self.dai,
        }
    }
}
