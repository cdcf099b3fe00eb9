//! Places and cells.

use serde::{Deserialize, Serialize};

use crate::error::{KairosError, KairosResult};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a point, rejecting values outside the valid ranges.
    pub fn validated(latitude: f64, longitude: f64) -> KairosResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(KairosError::invalid(
                "lat",
                format!("latitude must be between -90 and 90, got {}", latitude),
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(KairosError::invalid(
                "lon",
                format!("longitude must be between -180 and 180, got {}", longitude),
            ));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// Great-circle distance in meters (haversine, mean earth radius).
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_008.8;
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// A named place in the administrative hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEntity {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_local: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_names: Vec<String>,
    pub entity_type: String,
    pub admin_level: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<i64>,
    pub is_enabled: bool,
    /// Precomputed forecast cell for this place, if the association job has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<i64>,
}

impl GeoEntity {
    /// English name when known, otherwise the primary name.
    pub fn display_name(&self) -> &str {
        match self.name_en.as_deref() {
            Some(en) if !en.is_empty() => en,
            _ => &self.name,
        }
    }

    pub fn is_city(&self) -> bool {
        self.entity_type == "city"
    }

    /// Exact (case-sensitive) match against any of the stored names.
    pub fn has_name(&self, candidate: &str) -> bool {
        self.name == candidate
            || self.name_en.as_deref() == Some(candidate)
            || self.name_local.as_deref() == Some(candidate)
    }
}

/// A polygonal partition of the coverage area that buckets forecasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: i64,
    pub name: String,
    pub is_enabled: bool,
    /// Boundary centroid, used for distance reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<GeoPoint>,
}
