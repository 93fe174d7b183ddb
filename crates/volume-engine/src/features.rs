//! GeoJSON point features for map clients.

use serde::Serialize;

use crate::aggregator::CountryVolume;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<PointFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointFeature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Point,
    pub properties: FeatureProperties,
}

/// `coordinates` are `[lng, lat]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

/// Property keys stay snake_case; map clients read them by these names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureProperties {
    pub country: String,
    pub iso2: String,
    pub volume_usd: f64,
    pub volume_normalized: f64,
    pub exchange_count: u32,
    pub top_exchange: String,
}

impl From<&CountryVolume> for PointFeature {
    fn from(c: &CountryVolume) -> Self {
        Self {
            kind: "Feature",
            geometry: Point {
                kind: "Point",
                coordinates: [c.lng, c.lat],
            },
            properties: FeatureProperties {
                country: c.country.clone(),
                iso2: c.iso2.clone(),
                volume_usd: c.volume_usd,
                volume_normalized: c.volume_normalized,
                exchange_count: c.exchange_count,
                top_exchange: c.top_exchange.clone(),
            },
        }
    }
}

impl FeatureCollection {
    pub fn from_countries(countries: &[CountryVolume]) -> Self {
        Self {
            kind: "FeatureCollection",
            features: countries.iter().map(PointFeature::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
