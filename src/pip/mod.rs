//! Point-in-Polygon (PIP) sub-region lookup.
//!
//! Loads sub-region polygons from GeoJSON and answers point lookups
//! using an R-tree spatial index with a nearest-polygon fallback.

mod boundary;
mod index;

pub use boundary::{parse_feature_collection, read_boundaries, CatalogProperties, SubRegionBoundary};
pub use index::GeometryCatalog;
