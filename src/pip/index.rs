//! Spatial index for fast sub-region lookups.

use geo::{Distance, Euclidean, Intersects, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::boundary::{read_boundaries, CatalogProperties, SubRegionBoundary};
use crate::error::{CatalogLoadError, Result};
use crate::models::{GeoPoint, SubRegionRecord};

/// Wrapper for R-tree indexing of sub-region boundaries
#[derive(Clone)]
struct IndexedBoundary {
    /// Position in load order, used to keep candidate order deterministic
    order: usize,
    boundary: Arc<SubRegionBoundary>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBoundary {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedBoundary {
    fn new(order: usize, boundary: Arc<SubRegionBoundary>) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = boundary.bbox()?;
        Some(Self {
            order,
            boundary,
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// Polygon catalog answering "which sub-region holds this point".
///
/// Lookups go through the R-tree first and fall back to a linear
/// nearest-polygon scan, so a non-empty catalog always yields a sub-region.
pub struct GeometryCatalog {
    tree: RTree<IndexedBoundary>,
    /// Boundaries in load order for the nearest-polygon fallback
    boundaries: Vec<Arc<SubRegionBoundary>>,
}

impl GeometryCatalog {
    /// Load a GeoJSON polygon catalog. Fails when nothing usable was found.
    pub fn load(path: &Path, props: &CatalogProperties) -> Result<Self> {
        let boundaries = read_boundaries(path, props)?;
        let catalog = Self::build(boundaries);
        if catalog.is_empty() {
            return Err(CatalogLoadError::EmptyCatalog(path.to_path_buf()));
        }
        Ok(catalog)
    }

    /// Build from in-memory polygons (may be empty).
    pub fn from_polygons(polygons: Vec<(SubRegionRecord, Polygon<f64>)>) -> Self {
        Self::build(
            polygons
                .into_iter()
                .map(|(record, geometry)| SubRegionBoundary::new(record, geometry))
                .collect(),
        )
    }

    /// Build spatial index from sub-region boundaries
    pub fn build(boundaries: Vec<SubRegionBoundary>) -> Self {
        info!(
            "Building spatial index for {} polygons...",
            boundaries.len()
        );

        // Boundaries without a bounding box (empty rings) can never match
        let indexed: Vec<IndexedBoundary> = boundaries
            .into_iter()
            .map(Arc::new)
            .enumerate()
            .filter_map(|(order, b)| IndexedBoundary::new(order, b))
            .collect();

        let boundaries = indexed.iter().map(|ib| Arc::clone(&ib.boundary)).collect();
        let tree = RTree::bulk_load(indexed);

        info!("Spatial index built with {} entries", tree.size());

        Self { tree, boundaries }
    }

    /// Find the sub-region containing `point`, or the nearest one on a miss.
    ///
    /// Points on a polygon edge count as contained.
    pub fn locate(&self, point: GeoPoint) -> Option<SubRegionRecord> {
        if let Some(record) = self.locate_containing(point) {
            return Some(record);
        }

        let nearest = self.nearest(point);
        if let Some(record) = &nearest {
            debug!(
                "No polygon contains ({}, {}); using nearest sub-region {}",
                point.lat, point.lon, record.code
            );
        }
        nearest
    }

    /// Indexed containment test only; `None` when the point falls in a gap.
    pub fn locate_containing(&self, point: GeoPoint) -> Option<SubRegionRecord> {
        let query = Point::new(point.lon, point.lat);
        let query_envelope = AABB::from_point([point.lon, point.lat]);

        // Use R-tree to get candidates via envelope intersection, then filter with exact containment
        let mut candidates: Vec<&IndexedBoundary> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .collect();
        candidates.sort_unstable_by_key(|ib| ib.order);

        candidates
            .into_iter()
            .find(|ib| ib.boundary.geometry.intersects(&query))
            .map(|ib| ib.boundary.record.clone())
    }

    /// Linear scan for the polygon closest to `point` (planar distance in
    /// degrees). Ties keep the earliest loaded polygon.
    pub fn nearest(&self, point: GeoPoint) -> Option<SubRegionRecord> {
        let query = Point::new(point.lon, point.lat);

        let mut best: Option<(f64, &SubRegionBoundary)> = None;
        for boundary in &self.boundaries {
            let distance = Euclidean.distance(&query, &boundary.geometry);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, &**boundary));
            }
        }
        best.map(|(_, b)| b.record.clone())
    }

    /// Get total number of indexed polygons
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Iterate over all records in load order
    pub fn records(&self) -> impl Iterator<Item = &SubRegionRecord> {
        self.boundaries.iter().map(|b| &b.record)
    }
}
