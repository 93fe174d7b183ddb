pub fn default_enabled() -> bool {
    true
}

pub fn default_service_name() -> String {
    "stablemap".to_string()
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    8080
}

pub fn default_metrics_port() -> u16 {
    9090
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_coingecko_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

pub fn default_defillama_url() -> String {
    "https://stablecoins.llama.fi".to_string()
}

pub fn default_exchange_pages() -> u32 {
    2
}

pub fn default_per_page() -> u32 {
    250
}

pub fn default_min_request_interval_ms() -> u64 {
    2000
}

pub fn default_rate_limit_backoff_ms() -> u64 {
    5000
}

pub fn default_timeout_seconds() -> u64 {
    15
}

pub fn default_refresh_interval() -> u64 {
    900
}

pub fn default_other_stablecoin_uplift() -> f64 {
    1.12
}

pub fn default_top_countries() -> usize {
    10
}

pub fn default_coin_cap() -> f64 {
    0.95
}

pub fn default_all_cap() -> f64 {
    0.98
}

pub fn default_other_margin() -> f64 {
    0.05
}

pub fn default_min_intensity() -> f64 {
    0.60
}

pub fn default_max_intensity() -> f64 {
    0.96
}

pub fn default_pair_coverage() -> f64 {
    0.92
}

pub fn default_dai_share() -> f64 {
    0.02
}
