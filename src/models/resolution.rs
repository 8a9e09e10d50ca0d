//! Resolution output types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting grain, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GeographyLevel {
    /// Designated market area
    MediaMarket,
    /// State / territory
    State,
    /// Catch-all when nothing finer is trustworthy
    Global,
}

impl GeographyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeographyLevel::MediaMarket => "dma",
            GeographyLevel::State => "state",
            GeographyLevel::Global => "global",
        }
    }
}

impl fmt::Display for GeographyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable tag explaining why resolution stepped down a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallbackReason {
    #[serde(rename = "no_geographic_match")]
    NoGeographicMatch,
    #[serde(rename = "dma_geocoded_ratio_below_threshold")]
    MediaMarketGeocodedRatioBelowThreshold,
    #[serde(rename = "dma_weather_coverage_below_threshold")]
    MediaMarketWeatherCoverageBelowThreshold,
    #[serde(rename = "state_geocoded_ratio_below_threshold")]
    StateGeocodedRatioBelowThreshold,
    #[serde(rename = "state_weather_coverage_below_threshold")]
    StateWeatherCoverageBelowThreshold,
}

impl FallbackReason {
    /// Stable code written to audit sinks
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::NoGeographicMatch => "no_geographic_match",
            FallbackReason::MediaMarketGeocodedRatioBelowThreshold => {
                "dma_geocoded_ratio_below_threshold"
            }
            FallbackReason::MediaMarketWeatherCoverageBelowThreshold => {
                "dma_weather_coverage_below_threshold"
            }
            FallbackReason::StateGeocodedRatioBelowThreshold => {
                "state_geocoded_ratio_below_threshold"
            }
            FallbackReason::StateWeatherCoverageBelowThreshold => {
                "state_weather_coverage_below_threshold"
            }
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The region a geohash resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum GeographyScope {
    MediaMarket {
        code: String,
        display_name: String,
        state_code: String,
        state_numeric_id: String,
        sub_region_code: String,
        sub_region_name: String,
    },
    State {
        state_code: String,
        /// Unknown when the state was derived without a crosswalk row
        #[serde(skip_serializing_if = "Option::is_none")]
        state_numeric_id: Option<String>,
    },
    Global,
}

/// Result of a single lookup.
///
/// Built once per unique geohash per resolver and cached by value; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographyResolution {
    #[serde(flatten)]
    pub scope: GeographyScope,

    /// Trimmed input the resolution was computed for
    pub source_geohash: Option<String>,

    pub geocoded_ratio: Option<f64>,

    pub weather_coverage: Option<f64>,

    pub fallback_reason: Option<FallbackReason>,
}

impl GeographyResolution {
    pub fn level(&self) -> GeographyLevel {
        match self.scope {
            GeographyScope::MediaMarket { .. } => GeographyLevel::MediaMarket,
            GeographyScope::State { .. } => GeographyLevel::State,
            GeographyScope::Global => GeographyLevel::Global,
        }
    }

    /// Code of the chosen region (media market code or state code)
    pub fn region_code(&self) -> Option<&str> {
        match &self.scope {
            GeographyScope::MediaMarket { code, .. } => Some(code),
            GeographyScope::State { state_code, .. } => Some(state_code),
            GeographyScope::Global => None,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.scope, GeographyScope::Global)
    }
}
