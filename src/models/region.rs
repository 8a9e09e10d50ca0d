//! Region records loaded from the polygon catalog and the crosswalk table.

use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon) decoded from a geohash
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Metadata carried by one catalog polygon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubRegionRecord {
    /// Stable sub-region code, e.g. the five digit county FIPS "06037"
    pub code: String,

    /// Containing state code, e.g. "CA" (may be empty when the source omits it)
    pub state_code: String,

    /// Human-readable name
    pub name: String,
}

impl SubRegionRecord {
    pub fn new(
        code: impl Into<String>,
        state_code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            state_code: state_code.into(),
            name: name.into(),
        }
    }
}

/// One row of the sub-region -> media market / state crosswalk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosswalkRow {
    pub sub_region_code: String,
    pub sub_region_name: String,
    pub state_code: String,
    /// Two digit state id, e.g. "06"
    pub state_numeric_id: String,
    pub media_market_code: String,
    pub media_market_name: String,
}
