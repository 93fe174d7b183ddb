use crate::*;
use thiserror::Error;
use url::Url;

/// Refresh intervals below this are rejected
const MIN_REFRESH_SECONDS: u64 = 60;
/// Refresh intervals below this risk upstream rate limits
const RECOMMENDED_REFRESH_SECONDS: u64 = 300;
const MAX_PER_PAGE: u32 = 250;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("{field}: port must be non-zero")]
    InvalidPort { field: String },

    #[error("{field} and {other} use the same port {port}")]
    PortConflict { field: String, other: String, port: u16 },

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("{field}: invalid URL '{url}': {message}")]
    InvalidUrl { field: String, url: String, message: String },

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange { field: String, min: f64, max: f64, value: f64 },

    #[error("model.blending: min_intensity ({min}) is greater than max_intensity ({max})")]
    InvertedIntensityBounds { min: f64, max: f64 },

    #[error("refresh.interval_seconds must be at least {min}, got {value}")]
    RefreshTooFrequent { min: u64, value: u64 },

    #[error("Environment variable '{var}' is missing or invalid: {message}")]
    InvalidEnvVar { var: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &AppConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_service(config, &mut report);
    validate_sources(&config.sources, &mut report);
    validate_refresh(&config.refresh, &mut report);
    validate_model(&config.model, &mut report);
    validate_reference_data(&config.reference_data, &mut report);

    report
}

fn validate_service(config: &AppConfig, report: &mut ValidationReport) {
    if config.service.name.trim().is_empty() {
        report.add_error(ValidationError::MissingServiceName);
    }

    check_port("service.http_port", config.service.http_port, report);

    if config.metrics.enabled {
        check_port("metrics.port", config.metrics.port, report);
        if config.metrics.port == config.service.http_port {
            report.add_error(ValidationError::PortConflict {
                field: "metrics.port".to_string(),
                other: "service.http_port".to_string(),
                port: config.metrics.port,
            });
        }
    }

    if !["pretty", "json", "compact"].contains(&config.logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(config.logging.format.clone()));
    }
}

fn validate_sources(sources: &SourcesConfig, report: &mut ValidationReport) {
    let cg = &sources.coingecko;
    check_url("sources.coingecko.base_url", &cg.base_url, report);
    check_url("sources.defillama.base_url", &sources.defillama.base_url, report);

    if cg.pages == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "sources.coingecko.pages".to_string(),
        });
    }
    if cg.per_page == 0 || cg.per_page > MAX_PER_PAGE {
        report.add_error(ValidationError::OutOfRange {
            field: "sources.coingecko.per_page".to_string(),
            min: 1.0,
            max: MAX_PER_PAGE as f64,
            value: cg.per_page as f64,
        });
    }
    for (field, value) in [
        ("sources.coingecko.timeout_seconds", cg.timeout_seconds),
        ("sources.defillama.timeout_seconds", sources.defillama.timeout_seconds),
    ] {
        if value == 0 {
            report.add_error(ValidationError::InvalidPositiveInteger { field: field.to_string() });
        }
    }

    match &cg.api_key {
        Some(key) if has_unresolved_env_vars(key) => {
            for var in unresolved_env_vars(key) {
                report.add_error(ValidationError::InvalidEnvVar {
                    var,
                    message: "referenced by sources.coingecko.api_key".to_string(),
                });
            }
        }
        Some(_) => {}
        None => report.add_default("sources.coingecko.api_key", "none (public rate limits)"),
    }
}

fn validate_refresh(refresh: &RefreshConfig, report: &mut ValidationReport) {
    if refresh.interval_seconds < MIN_REFRESH_SECONDS {
        report.add_error(ValidationError::RefreshTooFrequent {
            min: MIN_REFRESH_SECONDS,
            value: refresh.interval_seconds,
        });
    } else if refresh.interval_seconds < RECOMMENDED_REFRESH_SECONDS {
        report.add_warning(
            "refresh.interval_seconds",
            "Intervals below 300 seconds may hit upstream rate limits",
        );
    }
}

fn validate_model(model: &ModelConfig, report: &mut ValidationReport) {
    let shares = &model.baseline_shares;
    check_unit("model.baseline_shares.usdt", shares.usdt, report);
    check_unit("model.baseline_shares.usdc", shares.usdc, report);
    check_unit("model.baseline_shares.dai", shares.dai, report);
    if shares.usdt + shares.usdc + shares.dai > 1.0 {
        report.add_warning(
            "model.baseline_shares",
            "Baseline shares sum to more than 1.0",
        );
    }

    let cal = &model.calibration;
    check_cap("model.calibration.coin_cap", cal.coin_cap, report);
    check_cap("model.calibration.all_cap", cal.all_cap, report);
    check_unit("model.calibration.other_margin", cal.other_margin, report);

    let blend = &model.blending;
    check_unit("model.blending.min_intensity", blend.min_intensity, report);
    check_unit("model.blending.max_intensity", blend.max_intensity, report);
    check_unit("model.blending.pair_coverage", blend.pair_coverage, report);
    check_unit("model.blending.dai_share", blend.dai_share, report);
    if blend.min_intensity > blend.max_intensity {
        report.add_error(ValidationError::InvertedIntensityBounds {
            min: blend.min_intensity,
            max: blend.max_intensity,
        });
    }

    if model.other_stablecoin_uplift.is_nan() || model.other_stablecoin_uplift < 1.0 {
        report.add_error(ValidationError::OutOfRange {
            field: "model.other_stablecoin_uplift".to_string(),
            min: 1.0,
            max: f64::INFINITY,
            value: model.other_stablecoin_uplift,
        });
    }
    if model.top_countries == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "model.top_countries".to_string(),
        });
    }
}

fn validate_reference_data(reference: &ReferenceDataConfig, report: &mut ValidationReport) {
    match &reference.path {
        Some(path) if has_unresolved_env_vars(path) => {
            for var in unresolved_env_vars(path) {
                report.add_error(ValidationError::InvalidEnvVar {
                    var,
                    message: "referenced by reference_data.path".to_string(),
                });
            }
        }
        Some(path) if !std::path::Path::new(path).is_dir() => {
            report.add_warning(
                "reference_data.path",
                &format!("'{}' is not a directory, embedded tables will be used", path),
            );
        }
        Some(_) => {}
        None => report.add_default("reference_data.path", "embedded tables"),
    }
}

fn check_port(field: &str, port: u16, report: &mut ValidationReport) {
    if port == 0 {
        report.add_error(ValidationError::InvalidPort { field: field.to_string() });
    }
}

fn check_url(field: &str, value: &str, report: &mut ValidationReport) {
    if has_unresolved_env_vars(value) {
        for var in unresolved_env_vars(value) {
            report.add_error(ValidationError::InvalidEnvVar {
                var,
                message: format!("referenced by {}", field),
            });
        }
        return;
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => report.add_error(ValidationError::InvalidUrl {
            field: field.to_string(),
            url: value.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => report.add_error(ValidationError::InvalidUrl {
            field: field.to_string(),
            url: value.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Value must lie in [0, 1]
fn check_unit(field: &str, value: f64, report: &mut ValidationReport) {
    if !(0.0..=1.0).contains(&value) {
        report.add_error(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: 1.0,
            value,
        });
    }
}

/// Value must lie in (0, 1]
fn check_cap(field: &str, value: f64, report: &mut ValidationReport) {
    if value <= 0.0 || !(0.0..=1.0).contains(&value) {
        report.add_error(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: 1.0,
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_config_is_valid() {
        let report = validate_config(&AppConfig::default());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
        assert_eq!(report.defaults_applied.len(), 2);
    }

    #[test]
    fn test_bad_values_are_reported() {
        let mut config = AppConfig::default();
        config.service.http_port = 0;
        config.logging.format = "xml".to_string();
        config.sources.coingecko.base_url = "not a url".to_string();
        config.sources.coingecko.per_page = 500;
        config.model.blending.min_intensity = 0.9;
        config.model.blending.max_intensity = 0.5;
        config.model.calibration.coin_cap = 0.0;

        let report = validate_config(&config);
        assert!(!report.is_valid());
        let has = |pred: fn(&ValidationError) -> bool| report.errors.iter().any(pred);
        assert!(has(|e| matches!(e, ValidationError::InvalidPort { .. })));
        assert!(has(|e| matches!(e, ValidationError::InvalidLogFormat(_))));
        assert!(has(|e| matches!(e, ValidationError::InvalidUrl { .. })));
        assert!(has(|e| matches!(e, ValidationError::OutOfRange { field, .. } if field == "sources.coingecko.per_page")));
        assert!(has(|e| matches!(e, ValidationError::InvertedIntensityBounds { .. })));
        assert!(has(|e| matches!(e, ValidationError::OutOfRange { field, .. } if field == "model.calibration.coin_cap")));
    }

    #[test]
    fn test_refresh_interval_bounds() {
        let mut config = AppConfig::default();
        config.refresh.interval_seconds = 30;
        let report = validate_config(&config);
        assert_matches!(
            report.errors.as_slice(),
            [ValidationError::RefreshTooFrequent { min: 60, value: 30 }]
        );

        config.refresh.interval_seconds = 120;
        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field, "refresh.interval_seconds");
    }

    #[test]
    fn test_unresolved_api_key_placeholder() {
        let mut config = AppConfig::default();
        config.sources.coingecko.api_key = Some("${STABLEMAP_UNSET_CG_KEY}".to_string());
        let report = validate_config(&config);
        assert_matches!(
            report.errors.as_slice(),
            [ValidationError::InvalidEnvVar { var, .. }] if var == "STABLEMAP_UNSET_CG_KEY"
        );
    }

    #[test]
    fn test_metrics_port_conflict() {
        let mut config = AppConfig::default();
        config.metrics.enabled = true;
        config.metrics.port = config.service.http_port;
        let report = validate_config(&config);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::PortConflict { .. })));
    }
}
