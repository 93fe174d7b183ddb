//! CoinGecko: exchange listing, base asset price and 24h stablecoin volume.
//!
//! The free tier allows roughly 30 calls a minute. Requests from one client
//! are spaced at least `min_request_interval_ms` apart, and a 429 is retried
//! once after `rate_limit_backoff_ms`.

use common::{Exchange, VerifiedVolumes};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{SourceError, SourceResult};

pub const PROVIDER: &str = "coingecko";

/// Exchange volumes come as `trade_volume_24h_btc`, so the base price is BTC's
pub const BASE_ASSET_ID: &str = "bitcoin";

/// CoinGecko ids of the tracked stablecoins, in usdt/usdc/dai order
pub const STABLECOIN_IDS: [&str; 3] = ["tether", "usd-coin", "dai"];

#[derive(Debug, Deserialize)]
struct ExchangeRecord {
    id: String,
    name: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    trust_score: Option<f64>,
    #[serde(default)]
    trade_volume_24h_btc: Option<f64>,
}

impl From<ExchangeRecord> for Exchange {
    fn from(r: ExchangeRecord) -> Self {
        Exchange {
            id: r.id,
            name: r.name,
            registered_country: r.country.filter(|c| !c.trim().is_empty()),
            trade_volume_base: r.trade_volume_24h_btc.unwrap_or(0.0).max(0.0),
            trust_score: r.trust_score,
        }
    }
}

/// Parse one `/exchanges` page. `None` when the body is not an array;
/// malformed entries inside an array are skipped.
pub fn parse_exchange_page(body: &Value) -> Option<Vec<Exchange>> {
    let entries = body.as_array()?;
    let mut exchanges = Vec::with_capacity(entries.len());
    for entry in entries {
        match ExchangeRecord::deserialize(entry) {
            Ok(record) => exchanges.push(record.into()),
            Err(e) => warn!(error = %e, "Skipping malformed exchange entry"),
        }
    }
    Some(exchanges)
}

pub fn base_price_path() -> String {
    format!("/simple/price?ids={}&vs_currencies=usd", BASE_ASSET_ID)
}

/// `{"bitcoin": {"usd": 60000}}` -> 60000
pub fn parse_price(body: &Value, asset_id: &str) -> SourceResult<f64> {
    let price = body
        .get(asset_id)
        .and_then(|a| a.get("usd"))
        .and_then(Value::as_f64)
        .ok_or_else(|| SourceError::decode(PROVIDER, format!("no usd price for '{}'", asset_id)))?;
    if price <= 0.0 {
        return Err(SourceError::no_data(PROVIDER, format!("non-positive price for '{}'", asset_id)));
    }
    Ok(price)
}

/// Verified volumes from `/simple/price?...&include_24hr_vol=true`.
/// `total` scales the three tracked coins up by `other_uplift` to cover
/// every other stablecoin.
pub fn parse_stablecoin_volumes(body: &Value, other_uplift: f64) -> SourceResult<VerifiedVolumes> {
    let volume = |id: &str| {
        body.get(id)
            .and_then(|c| c.get("usd_24h_vol"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    };
    let [usdt, usdc, dai] = STABLECOIN_IDS.map(volume);

    let sum = usdt + usdc + dai;
    if sum <= 0.0 {
        return Err(SourceError::no_data(PROVIDER, "no stablecoin volume reported"));
    }
    Ok(VerifiedVolumes {
        usdt,
        usdc,
        dai,
        total: sum * other_uplift,
    })
}

#[cfg(feature = "client")]
pub use client::CoinGeckoClient;

#[cfg(feature = "client")]
mod client {
    use async_trait::async_trait;
    use common::{Exchange, VerifiedVolumes};
    use config::CoinGeckoConfig;
    use reqwest::{Client, StatusCode};
    use serde_json::Value;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::Instant;
    use tracing::{debug, info, instrument, warn};

    use super::{
        base_price_path, parse_exchange_page, parse_price, parse_stablecoin_volumes, BASE_ASSET_ID, PROVIDER,
        STABLECOIN_IDS,
    };
    use crate::error::{SourceError, SourceResult};
    use crate::traits::{ExchangeSource, VolumeSource};

    const API_KEY_HEADER: &str = "x-cg-demo-api-key";
    const DEFAULT_UPLIFT: f64 = 1.12;

    pub struct CoinGeckoClient {
        client: Client,
        base_url: String,
        api_key: Option<String>,
        pages: u32,
        per_page: u32,
        min_interval: Duration,
        backoff: Duration,
        other_uplift: f64,
        last_request: Mutex<Option<Instant>>,
    }

    impl CoinGeckoClient {
        pub fn new(config: &CoinGeckoConfig) -> SourceResult<Self> {
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
                api_key: config.api_key.clone(),
                pages: config.pages,
                per_page: config.per_page,
                min_interval: Duration::from_millis(config.min_request_interval_ms),
                backoff: Duration::from_millis(config.rate_limit_backoff_ms),
                other_uplift: DEFAULT_UPLIFT,
                last_request: Mutex::new(None),
            })
        }

        /// Multiplier from USDT + USDC + DAI volume to all-stablecoin volume
        pub fn with_other_stablecoin_uplift(mut self, uplift: f64) -> Self {
            self.other_uplift = uplift;
            self
        }

        /// Wait until `min_interval` has passed since the previous request.
        /// The lock is held while sleeping so concurrent callers queue up.
        async fn throttle(&self) {
            let mut last = self.last_request.lock().await;
            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < self.min_interval {
                    tokio::time::sleep(self.min_interval - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        async fn send(&self, url: &str) -> SourceResult<reqwest::Response> {
            self.throttle().await;
            let mut request = self.client.get(url).header("Accept", "application/json");
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }
            request.send().await.map_err(|e| SourceError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })
        }

        async fn get_json(&self, path: &str) -> SourceResult<Value> {
            let url = format!("{}{}", self.base_url, path);

            let mut response = self.send(&url).await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                warn!(%url, backoff_ms = self.backoff.as_millis() as u64, "Rate limited, retrying once");
                tokio::time::sleep(self.backoff).await;
                response = self.send(&url).await?;
                if response.status() == StatusCode::TOO_MANY_REQUESTS {
                    return Err(SourceError::RateLimited { provider: PROVIDER });
                }
            }

            if !response.status().is_success() {
                return Err(SourceError::Status {
                    provider: PROVIDER,
                    status: response.status().as_u16(),
                    url,
                });
            }

            response
                .json()
                .await
                .map_err(|e| SourceError::decode(PROVIDER, e.to_string()))
        }
    }

    #[async_trait]
    impl ExchangeSource for CoinGeckoClient {
        #[instrument(skip(self))]
        async fn fetch_exchanges(&self) -> SourceResult<Vec<Exchange>> {
            let mut exchanges = Vec::new();
            let mut last_error = None;
            let mut pages_ok = 0;

            for page in 1..=self.pages {
                let path = format!("/exchanges?per_page={}&page={}", self.per_page, page);
                match self.get_json(&path).await {
                    Ok(body) => match parse_exchange_page(&body) {
                        Some(batch) => {
                            debug!(page, count = batch.len(), "Fetched exchange page");
                            pages_ok += 1;
                            exchanges.extend(batch);
                        }
                        None => {
                            warn!(page, "Exchange page is not an array, skipping");
                            last_error = Some(SourceError::decode(PROVIDER, format!("page {} is not an array", page)));
                        }
                    },
                    Err(e) => {
                        warn!(page, error = %e, "Failed to fetch exchange page, skipping");
                        last_error = Some(e);
                    }
                }
            }

            if pages_ok == 0 {
                return Err(last_error.unwrap_or_else(|| SourceError::no_data(PROVIDER, "no pages requested")));
            }
            info!(count = exchanges.len(), pages_ok, "Fetched exchanges");
            Ok(exchanges)
        }

        async fn fetch_base_price(&self) -> SourceResult<f64> {
            let body = self.get_json(&base_price_path()).await?;
            parse_price(&body, BASE_ASSET_ID)
        }
    }

    #[async_trait]
    impl VolumeSource for CoinGeckoClient {
        async fn fetch_verified_volumes(&self) -> SourceResult<VerifiedVolumes> {
            let path = format!(
                "/simple/price?ids={}&vs_currencies=usd&include_24hr_vol=true",
                STABLECOIN_IDS.join(",")
            );
            let body = self.get_json(&path).await?;
            let volumes = parse_stablecoin_volumes(&body, self.other_uplift)?;
            info!(
                usdt = volumes.usdt,
                usdc = volumes.usdc,
                dai = volumes.dai,
                total = volumes.total,
                "Fetched stablecoin 24h volumes"
            );
            Ok(volumes)
        }
    }
}
