//! Configuration for stablemap
//!
//! One YAML document drives the service: where to listen, how to log,
//! which upstream data sources to poll and how often, and the tunable
//! constants of the estimation model. Every section has defaults, so an
//! empty document is a valid configuration.

use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub reference_data: ReferenceDataConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `pretty`, `json` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub coingecko: CoinGeckoConfig,
    #[serde(default)]
    pub defillama: DefiLlamaConfig,
}

/// Exchange list, base asset price and verified stablecoin volumes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoinGeckoConfig {
    #[serde(default = "default_coingecko_url")]
    pub base_url: String,
    /// Sent as `x-cg-demo-api-key` when set
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_exchange_pages")]
    pub pages: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: default_coingecko_url(),
            api_key: None,
            pages: default_exchange_pages(),
            per_page: default_per_page(),
            min_request_interval_ms: default_min_request_interval_ms(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// On-chain stablecoin supply
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefiLlamaConfig {
    #[serde(default = "default_defillama_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for DefiLlamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_defillama_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_enabled")]
    pub run_on_startup: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval(),
            run_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Global market mix the static weight tables were authored against
    #[serde(default)]
    pub baseline_shares: BaselineShares,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub blending: BlendingConfig,
    /// Multiplier turning USDT + USDC + DAI volume into all-stablecoin volume
    #[serde(default = "default_other_stablecoin_uplift")]
    pub other_stablecoin_uplift: f64,
    #[serde(default = "default_top_countries")]
    pub top_countries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            baseline_shares: BaselineShares::default(),
            calibration: CalibrationConfig::default(),
            blending: BlendingConfig::default(),
            other_stablecoin_uplift: default_other_stablecoin_uplift(),
            top_countries: default_top_countries(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BaselineShares {
    pub usdt: f64,
    pub usdc: f64,
    pub dai: f64,
}

impl Default for BaselineShares {
    fn default() -> Self {
        Self {
            usdt: 0.65,
            usdc: 0.22,
            dai: 0.03,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CalibrationConfig {
    #[serde(default = "default_coin_cap")]
    pub coin_cap: f64,
    #[serde(default = "default_all_cap")]
    pub all_cap: f64,
    #[serde(default = "default_other_margin")]
    pub other_margin: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            coin_cap: default_coin_cap(),
            all_cap: default_all_cap(),
            other_margin: default_other_margin(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BlendingConfig {
    #[serde(default = "default_min_intensity")]
    pub min_intensity: f64,
    #[serde(default = "default_max_intensity")]
    pub max_intensity: f64,
    #[serde(default = "default_pair_coverage")]
    pub pair_coverage: f64,
    #[serde(default = "default_dai_share")]
    pub dai_share: f64,
}

impl Default for BlendingConfig {
    fn default() -> Self {
        Self {
            min_intensity: default_min_intensity(),
            max_intensity: default_max_intensity(),
            pair_coverage: default_pair_coverage(),
            dai_share: default_dai_share(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReferenceDataConfig {
    /// Directory whose YAML documents replace the embedded tables
    #[serde(default)]
    pub path: Option<String>,
}
