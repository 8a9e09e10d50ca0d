//! Sub-region polygons read from a GeoJSON FeatureCollection.

use geo::{BoundingRect, Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CatalogLoadError, Result};
use crate::models::SubRegionRecord;

/// Sub-region codes given as JSON numbers are padded to this width (county FIPS)
const NUMERIC_CODE_WIDTH: usize = 5;

/// A single sub-region polygon with metadata
#[derive(Debug, Clone)]
pub struct SubRegionBoundary {
    pub record: SubRegionRecord,
    pub geometry: Polygon<f64>,
}

impl SubRegionBoundary {
    pub fn new(record: SubRegionRecord, geometry: Polygon<f64>) -> Self {
        Self { record, geometry }
    }

    /// Get the bounding box of this boundary
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Feature property names carrying the sub-region metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogProperties {
    pub code: String,
    pub state: String,
    pub name: String,
}

impl Default for CatalogProperties {
    fn default() -> Self {
        Self {
            code: "geoid".to_string(),
            state: "state".to_string(),
            name: "name".to_string(),
        }
    }
}

/// Read sub-region boundaries from a GeoJSON file.
pub fn read_boundaries(path: &Path, props: &CatalogProperties) -> Result<Vec<SubRegionBoundary>> {
    info!("Reading sub-region polygons from {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| CatalogLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| CatalogLoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_feature_collection(&value, props))
}

/// Extract boundaries from a parsed FeatureCollection.
///
/// Features without a code or a usable ring are skipped. A MultiPolygon
/// feature yields one boundary per member polygon.
pub fn parse_feature_collection(value: &Value, props: &CatalogProperties) -> Vec<SubRegionBoundary> {
    let mut boundaries = Vec::new();
    let mut skipped = 0usize;

    let features = value["features"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    for feature in features {
        let properties = &feature["properties"];
        let Some(code) = property_string(&properties[props.code.as_str()], Some(NUMERIC_CODE_WIDTH))
        else {
            skipped += 1;
            continue;
        };
        let record = SubRegionRecord {
            code,
            state_code: property_string(&properties[props.state.as_str()], None).unwrap_or_default(),
            name: property_string(&properties[props.name.as_str()], None).unwrap_or_default(),
        };

        let polygons = parse_geometry(&feature["geometry"]);
        if polygons.is_empty() {
            debug!("No usable geometry for sub-region {}", record.code);
            skipped += 1;
            continue;
        }
        for polygon in polygons {
            boundaries.push(SubRegionBoundary::new(record.clone(), polygon));
        }
    }

    info!(
        "Found {} sub-region polygons ({} features skipped)",
        boundaries.len(),
        skipped
    );
    boundaries
}

fn parse_geometry(geometry: &Value) -> Vec<Polygon<f64>> {
    let coords = geometry["coordinates"].as_array();
    match (geometry["type"].as_str(), coords) {
        (Some("Polygon"), Some(rings)) => parse_polygon(rings).into_iter().collect(),
        (Some("MultiPolygon"), Some(polygons)) => polygons
            .iter()
            .filter_map(Value::as_array)
            .filter_map(|rings| parse_polygon(rings))
            .collect(),
        _ => Vec::new(),
    }
}

/// First ring is the exterior, the rest are holes. Degenerate holes are dropped.
fn parse_polygon(rings: &[Value]) -> Option<Polygon<f64>> {
    let exterior = parse_ring(rings.first()?.as_array()?)?;
    let interiors = rings[1..]
        .iter()
        .filter_map(Value::as_array)
        .filter_map(|ring| parse_ring(ring))
        .collect();
    Some(Polygon::new(exterior, interiors))
}

fn parse_ring(coords: &[Value]) -> Option<LineString<f64>> {
    let mut points: Vec<Coord<f64>> = coords
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_array()?;
            let x = pair.first()?.as_f64()?;
            let y = pair.get(1)?.as_f64()?;
            (x.is_finite() && y.is_finite()).then_some(Coord { x, y })
        })
        .collect();

    // Close the ring if needed
    if points.first() != points.last() {
        let first = points[0];
        points.push(first);
    }

    (points.len() >= 4).then(|| LineString::new(points))
}

/// Property value as a trimmed string; numbers are stringified and, when a
/// width is given, zero-padded.
fn property_string(value: &Value, pad_numbers_to: Option<usize>) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            let s = n.to_string();
            match pad_numbers_to {
                Some(width) => format!("{:0>width$}", s, width = width),
                None => s,
            }
        }
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}
