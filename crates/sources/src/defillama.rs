//! DefiLlama stablecoin supply: global market caps and per-chain breakdown.

use common::{ChainAmounts, ChainBreakdown, LiveOnChainData, LiveShares};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{SourceError, SourceResult};

pub const PROVIDER: &str = "defillama";

/// Chains reported in the breakdown: DefiLlama name and our lowercase key
pub const TRACKED_CHAINS: [(&str, &str); 6] = [
    ("Tron", "tron"),
    ("Ethereum", "ethereum"),
    ("Solana", "solana"),
    ("BSC", "bsc"),
    ("Arbitrum", "arbitrum"),
    ("Base", "base"),
];

/// Shares assumed when the response carries no supply at all
const FALLBACK_SHARES: LiveShares = LiveShares::new(0.65, 0.22, 0.03);

#[derive(Debug, Deserialize)]
struct PeggedResponse {
    #[serde(rename = "peggedAssets")]
    pegged_assets: Vec<PeggedAsset>,
}

#[derive(Debug, Default, Deserialize)]
struct PeggedAmount {
    #[serde(rename = "peggedUSD", default)]
    pegged_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChainCirculating {
    #[serde(default)]
    current: PeggedAmount,
}

#[derive(Debug, Deserialize)]
struct PeggedAsset {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    circulating: PeggedAmount,
    #[serde(rename = "chainCirculating", default)]
    chain_circulating: HashMap<String, ChainCirculating>,
}

impl PeggedAsset {
    fn market_cap(&self) -> f64 {
        self.circulating.pegged_usd.unwrap_or(0.0)
    }

    fn on_chain(&self, chain: &str) -> f64 {
        self.chain_circulating
            .get(chain)
            .and_then(|c| c.current.pegged_usd)
            .unwrap_or(0.0)
    }
}

/// Parse `/stablecoins?includePrices=false`
pub fn parse_stablecoins(body: Value) -> SourceResult<LiveOnChainData> {
    let response: PeggedResponse =
        serde_json::from_value(body).map_err(|e| SourceError::decode(PROVIDER, e.to_string()))?;
    let assets = response.pegged_assets;

    let find = |symbol: &str| assets.iter().find(|a| a.symbol == symbol);
    let usdt = find("USDT");
    let usdc = find("USDC");
    let dai = find("DAI");

    let cap = |asset: Option<&PeggedAsset>| asset.map(PeggedAsset::market_cap).unwrap_or(0.0);
    let usdt_market_cap = cap(usdt);
    let usdc_market_cap = cap(usdc);
    let dai_market_cap = cap(dai);
    let total_market_cap: f64 = assets.iter().map(PeggedAsset::market_cap).sum();

    let shares = if total_market_cap > 0.0 {
        LiveShares::new(
            usdt_market_cap / total_market_cap,
            usdc_market_cap / total_market_cap,
            dai_market_cap / total_market_cap,
        )
    } else {
        FALLBACK_SHARES
    };

    let chain = |asset: Option<&PeggedAsset>, name: &str| asset.map(|a| a.on_chain(name)).unwrap_or(0.0);
    let chain_breakdown: ChainBreakdown = TRACKED_CHAINS
        .iter()
        .map(|(name, key)| {
            let amounts = ChainAmounts {
                usdt: chain(usdt, name),
                usdc: chain(usdc, name),
            };
            (key.to_string(), amounts)
        })
        .collect();

    Ok(LiveOnChainData {
        usdt_market_cap,
        usdc_market_cap,
        dai_market_cap,
        total_market_cap,
        shares,
        chain_breakdown,
    })
}

#[cfg(feature = "client")]
pub use client::DefiLlamaClient;

#[cfg(feature = "client")]
mod client {
    use async_trait::async_trait;
    use common::LiveOnChainData;
    use config::DefiLlamaConfig;
    use reqwest::Client;
    use serde_json::Value;
    use std::time::Duration;
    use tracing::{info, instrument};

    use super::{parse_stablecoins, PROVIDER};
    use crate::error::{SourceError, SourceResult};
    use crate::traits::OnChainSource;

    pub struct DefiLlamaClient {
        client: Client,
        base_url: String,
    }

    impl DefiLlamaClient {
        pub fn new(config: &DefiLlamaConfig) -> SourceResult<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .map_err(|e| SourceError::Request {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;
            Ok(Self {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            })
        }
    }

    #[async_trait]
    impl OnChainSource for DefiLlamaClient {
        #[instrument(skip(self))]
        async fn fetch_on_chain(&self) -> SourceResult<LiveOnChainData> {
            let url = format!("{}/stablecoins?includePrices=false", self.base_url);

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| SourceError::Request {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;

            if !response.status().is_success() {
                return Err(SourceError::Status {
                    provider: PROVIDER,
                    status: response.status().as_u16(),
                    url,
                });
            }

            let body: Value = response
                .json()
                .await
                .map_err(|e| SourceError::decode(PROVIDER, e.to_string()))?;
            let data = parse_stablecoins(body)?;
            info!(
                total_market_cap = data.total_market_cap,
                usdt_share = data.shares.usdt,
                usdc_share = data.shares.usdc,
                "Fetched on-chain stablecoin supply"
            );
            Ok(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "peggedAssets": [
                {
                    "id": "1", "name": "Tether", "symbol": "USDT",
                    "circulating": {"peggedUSD": 140e9},
                    "chainCirculating": {
                        "Tron": {"current": {"peggedUSD": 60e9}},
                        "Ethereum": {"current": {"peggedUSD": 70e9}}
                    }
                },
                {
                    "id": "2", "name": "USD Coin", "symbol": "USDC",
                    "circulating": {"peggedUSD": 60e9},
                    "chainCirculating": {
                        "Ethereum": {"current": {"peggedUSD": 35e9}},
                        "Base": {"current": {"peggedUSD": 4e9}}
                    }
                },
                {"id": "3", "name": "Dai", "symbol": "DAI", "circulating": {"peggedUSD": 5e9}},
                {"id": "4", "name": "Other", "symbol": "FDUSD", "circulating": {"peggedUSD": 25e9}}
            ]
        })
    }

    #[test]
    fn test_market_caps_and_shares() {
        let data = parse_stablecoins(sample()).unwrap();
        assert_eq!(data.usdt_market_cap, 140e9);
        assert_eq!(data.usdc_market_cap, 60e9);
        assert_eq!(data.dai_market_cap, 5e9);
        assert_eq!(data.total_market_cap, 230e9);
        assert!((data.shares.usdt - 140.0 / 230.0).abs() < 1e-12);
        assert!((data.shares.dai - 5.0 / 230.0).abs() < 1e-12);
    }

    #[test]
    fn test_chain_breakdown_covers_tracked_chains() {
        let data = parse_stablecoins(sample()).unwrap();
        assert_eq!(data.chain_breakdown.len(), TRACKED_CHAINS.len());
        assert_eq!(data.chain_breakdown["tron"], ChainAmounts { usdt: 60e9, usdc: 0.0 });
        assert_eq!(data.chain_breakdown["ethereum"], ChainAmounts { usdt: 70e9, usdc: 35e9 });
        assert_eq!(data.chain_breakdown["base"].usdc, 4e9);
        assert_eq!(data.chain_breakdown["solana"], ChainAmounts::default());
    }

    #[test]
    fn test_empty_supply_falls_back_to_baseline_shares() {
        let data = parse_stablecoins(json!({"peggedAssets": []})).unwrap();
        assert_eq!(data.total_market_cap, 0.0);
        assert_eq!(data.shares, FALLBACK_SHARES);
    }

    #[test]
    fn test_missing_assets_field_is_an_error() {
        assert!(parse_stablecoins(json!({"error": "down"})).is_err());
    }
}
