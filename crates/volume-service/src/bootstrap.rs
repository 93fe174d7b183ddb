//! Building the service from an `AppConfig`.

use common::LiveShares;
use config::{ModelConfig, ReferenceDataConfig};
use reference_data::ReferenceData;
use std::sync::Arc;
use tracing::info;
use volume_engine::{Aggregator, BlendParams, CalibrationParams};

use crate::error::ServiceResult;

/// Embedded tables, or the configured override directory
pub fn load_reference_data(config: &ReferenceDataConfig) -> ServiceResult<Arc<ReferenceData>> {
    let data = match &config.path {
        Some(path) => ReferenceData::load_dir(path)?,
        None => ReferenceData::builtin()?,
    };

    // consistency warnings are logged by the loader
    info!(
        countries = data.countries.len(),
        regulations = data.regulations.all().len(),
        overrides = config.path.is_some(),
        "Reference data ready"
    );
    Ok(Arc::new(data))
}

pub fn calibration_params(model: &ModelConfig) -> CalibrationParams {
    let baseline = &model.baseline_shares;
    CalibrationParams {
        baseline: LiveShares::new(baseline.usdt, baseline.usdc, baseline.dai),
        coin_cap: model.calibration.coin_cap,
        all_cap: model.calibration.all_cap,
        other_margin: model.calibration.other_margin,
    }
}

pub fn blend_params(model: &ModelConfig) -> BlendParams {
    let blending = &model.blending;
    BlendParams {
        min_intensity: blending.min_intensity,
        max_intensity: blending.max_intensity,
        pair_coverage: blending.pair_coverage,
        dai_share: blending.dai_share,
    }
}

pub fn aggregator(data: Arc<ReferenceData>, model: &ModelConfig) -> Aggregator {
    Aggregator::new(data, calibration_params(model), blend_params(model))
        .with_top_countries(model.top_countries)
}

#[cfg(feature = "client")]
mod live {
    use config::AppConfig;
    use sources::{CoinGeckoClient, DefiLlamaClient};
    use std::sync::Arc;

    use crate::error::{ServiceError, ServiceResult};
    use crate::service::VolumeService;

    impl VolumeService {
        /// Service backed by the CoinGecko and DefiLlama HTTP clients
        pub fn from_config(config: &AppConfig) -> ServiceResult<Self> {
            let data = super::load_reference_data(&config.reference_data)?;
            let aggregator = super::aggregator(data, &config.model);

            let coingecko = Arc::new(
                CoinGeckoClient::new(&config.sources.coingecko)
                    .map_err(|e| ServiceError::Setup(e.to_string()))?
                    .with_other_stablecoin_uplift(config.model.other_stablecoin_uplift),
            );
            let defillama = Arc::new(
                DefiLlamaClient::new(&config.sources.defillama)
                    .map_err(|e| ServiceError::Setup(e.to_string()))?,
            );

            Ok(Self::new(aggregator, coingecko.clone(), defillama, coingecko))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::AppConfig;

    #[test]
    fn test_params_follow_model_config() {
        let mut config = AppConfig::default();
        config.model.calibration.coin_cap = 0.9;
        config.model.blending.max_intensity = 0.8;
        config.model.baseline_shares.usdt = 0.7;

        let calibration = calibration_params(&config.model);
        assert_eq!(calibration.coin_cap, 0.9);
        assert_eq!(calibration.baseline.usdt, 0.7);
        assert_eq!(blend_params(&config.model).max_intensity, 0.8);
    }

    #[test]
    fn test_default_model_matches_engine_defaults() {
        let model = AppConfig::default().model;
        assert_eq!(calibration_params(&model), CalibrationParams::default());
        assert_eq!(blend_params(&model), BlendParams::default());
    }

    #[test]
    fn test_builtin_reference_data() {
        let data = tokio_test::assert_ok!(load_reference_data(&ReferenceDataConfig::default()));
        assert!(data.countries.resolve("Germany").is_some());
    }

    #[test]
    fn test_reference_data_override_dir() {
        let dir = std::env::temp_dir().join(format!("stablemap-bootstrap-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("regulations.yaml"),
            "regulations:\n  - { country: Brazil, iso2: BR, status: partial, summary: BCB rules }\n",
        )
        .unwrap();

        let config = ReferenceDataConfig {
            path: Some(dir.to_string_lossy().into_owned()),
        };
        let data = tokio_test::assert_ok!(load_reference_data(&config));
        assert_eq!(data.regulations.all().len(), 1);
        assert!(data.regulations.by_iso2("br").is_some());
        assert!(data.countries.resolve("Brazil").is_some());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
