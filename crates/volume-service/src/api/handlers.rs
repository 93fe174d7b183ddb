//! API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use common::StablecoinFilter;
use reference_data::{CountryRegulation, RegulationStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ServiceError;
use crate::service::{VolumeResponse, VolumeService};

#[derive(Debug, Default, Deserialize)]
pub struct VolumeQuery {
    pub filter: Option<String>,
}

impl VolumeQuery {
    /// Absent or empty means `all`
    fn filter(&self) -> Result<StablecoinFilter, ServiceError> {
        match self.filter.as_deref().map(str::trim) {
            None | Some("") => Ok(StablecoinFilter::All),
            Some(raw) => raw
                .parse()
                .map_err(|_| ServiceError::InvalidFilter(raw.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegulationList {
    pub count: usize,
    pub regulations: Vec<CountryRegulation>,
}

/// `GET /api/v1/volume?filter=`
pub async fn get_volume(
    State(service): State<Arc<VolumeService>>,
    Query(query): Query<VolumeQuery>,
) -> Result<Json<VolumeResponse>, ServiceError> {
    let filter = query.filter()?;
    Ok(Json(service.volume(filter)?))
}

/// `GET /api/v1/regulations`
pub async fn list_regulations(State(service): State<Arc<VolumeService>>) -> Json<RegulationList> {
    let regulations = service.reference_data().regulations.all().to_vec();
    Json(RegulationList {
        count: regulations.len(),
        regulations,
    })
}

/// `GET /api/v1/regulations/stats`
pub async fn regulation_stats(State(service): State<Arc<VolumeService>>) -> Json<RegulationStats> {
    Json(service.reference_data().regulations.stats())
}

/// `GET /api/v1/regulations/:iso2`
pub async fn get_regulation(
    State(service): State<Arc<VolumeService>>,
    Path(iso2): Path<String>,
) -> Result<Json<CountryRegulation>, ServiceError> {
    service
        .reference_data()
        .regulations
        .by_iso2(&iso2)
        .cloned()
        .map(Json)
        .ok_or(ServiceError::UnknownCountry(iso2))
}
