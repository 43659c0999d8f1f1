use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::error::{ResolverError, ResolverResult};

// --- Geo Types ---

/// Kilometres per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.32;

/// One mile, the default adjacency radius.
pub const DEFAULT_RADIUS_KM: f64 = 1.609344;

/// A WGS84 coordinate supplied per query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Validate and build a point. Rejects NaN, infinities and
    /// coordinates outside the WGS84 range.
    pub fn new(lng: f64, lat: f64) -> ResolverResult<Self> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(ResolverError::InvalidInput(format!(
                "coordinates must be finite numbers, got lng={lng} lat={lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            return Err(ResolverError::InvalidInput(format!(
                "coordinates out of range, got lng={lng} lat={lat}"
            )));
        }
        Ok(Self { lng, lat })
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lng, p.lat)
    }
}

/// Haversine great-circle distance between two lat/lng points in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

// --- Neighborhood ---

/// A named boundary (an NTA in the NYC dataset). Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood {
    /// Unique identifier, e.g. `MN0502`.
    pub code: String,
    pub name: String,
    pub borough: Option<String>,
    /// Polygon features are stored as a one-member multipolygon.
    pub geometry: MultiPolygon<f64>,
    /// The feature's source property bag, kept for downstream joins.
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Neighborhood {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        borough: Option<String>,
        geometry: MultiPolygon<f64>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            borough,
            geometry,
            properties: serde_json::Map::new(),
        }
    }
}
