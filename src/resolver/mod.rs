//! Geohash -> reporting region resolution.
//!
//! Flow: decode -> polygon lookup -> crosswalk join -> media market gate ->
//! state gate -> global. Every input yields a [`GeographyResolution`]; only
//! construction can fail.

mod cache;

pub use cache::{CacheStats, ResolverCache};

use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;
use crate::coverage::{CoverageGate, CoverageMetrics};
use crate::crosswalk::{numeric_prefix, CrosswalkTable};
use crate::error::Result;
use crate::geohash;
use crate::models::{
    CrosswalkRow, FallbackReason, GeographyResolution, GeographyScope, SubRegionRecord,
};
use crate::pip::{CatalogProperties, GeometryCatalog};

/// Coverage-aware region resolver.
///
/// Coverage metrics are fixed at construction. Resolving with different
/// metrics means building a new resolver, which also starts a fresh cache.
pub struct Resolver {
    catalog: GeometryCatalog,
    crosswalk: CrosswalkTable,
    metrics: CoverageMetrics,
    gate: CoverageGate,
    cache: ResolverCache,
}

impl Resolver {
    pub fn new(catalog: GeometryCatalog, crosswalk: CrosswalkTable, metrics: CoverageMetrics) -> Self {
        Self::with_gate(catalog, crosswalk, metrics, CoverageGate::default())
    }

    pub fn with_gate(
        catalog: GeometryCatalog,
        crosswalk: CrosswalkTable,
        metrics: CoverageMetrics,
        gate: CoverageGate,
    ) -> Self {
        Self {
            catalog,
            crosswalk,
            // Metrics deserialized from config bypass `CoverageMetrics::new`
            metrics: CoverageMetrics::new(metrics.geocoded_ratio, metrics.weather_coverage),
            gate,
            cache: ResolverCache::new(),
        }
    }

    /// Load a GeoJSON polygon catalog and a CSV crosswalk, then build a resolver.
    pub fn construct(
        polygon_source: &Path,
        crosswalk_source: &Path,
        geocoded_ratio: Option<f64>,
        weather_coverage: Option<f64>,
    ) -> Result<Self> {
        let catalog = GeometryCatalog::load(polygon_source, &CatalogProperties::default())?;
        let crosswalk = CrosswalkTable::load(crosswalk_source, b',')?;
        Ok(Self::new(
            catalog,
            crosswalk,
            CoverageMetrics::new(geocoded_ratio, weather_coverage),
        ))
    }

    /// Build a resolver from a loaded [`Config`], using its metrics and thresholds.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with_metrics(config, config.coverage)
    }

    /// Like [`Resolver::from_config`] but with caller-supplied metrics.
    pub fn from_config_with_metrics(config: &Config, metrics: CoverageMetrics) -> Result<Self> {
        let delimiter = config.crosswalk.delimiter_byte()?;
        let catalog = GeometryCatalog::load(&config.catalog.path, &config.catalog.properties)?;
        let crosswalk = CrosswalkTable::load(&config.crosswalk.path, delimiter)?;

        info!(
            "Resolver ready: {} polygons, {} crosswalk rows, geocoded_ratio={:?}, weather_coverage={:?}",
            catalog.len(),
            crosswalk.len(),
            metrics.geocoded_ratio,
            metrics.weather_coverage
        );

        Ok(Self::with_gate(
            catalog,
            crosswalk,
            metrics,
            CoverageGate::new(config.thresholds),
        ))
    }

    /// Resolve one geohash. Never fails.
    pub fn lookup(&self, geohash: &str) -> GeographyResolution {
        let key = geohash.trim();
        if key.is_empty() {
            return self.resolution(GeographyScope::Global, None, None);
        }

        if let Some(cached) = self.cache.get(key) {
            return cached;
        }

        let resolution = self.resolve_uncached(key);
        self.cache.put(key, resolution.clone());
        resolution
    }

    /// Resolve many geohashes in parallel, preserving input order.
    pub fn lookup_many<S>(&self, geohashes: &[S]) -> Vec<GeographyResolution>
    where
        S: AsRef<str> + Sync,
    {
        geohashes
            .par_iter()
            .map(|g| self.lookup(g.as_ref()))
            .collect()
    }

    fn resolve_uncached(&self, key: &str) -> GeographyResolution {
        let Some(point) = geohash::decode(key) else {
            debug!("Could not decode geohash '{}'", key);
            return self.resolution(GeographyScope::Global, Some(key), None);
        };

        let record = self.catalog.locate(point);
        let row = record
            .as_ref()
            .and_then(|r| self.crosswalk.lookup(&r.code));

        let mut media_market_reason = None;
        if let (Some(record), Some(row)) = (&record, row) {
            match self.gate.evaluate_media_market(&self.metrics) {
                Ok(()) => {
                    return self.resolution(media_market_scope(record, row), Some(key), None);
                }
                Err(reason) => {
                    debug!("'{}' not eligible for media market {}: {}", key, row.media_market_code, reason);
                    media_market_reason = Some(reason);
                }
            }
        }

        let Some((state_code, state_numeric_id)) = self.candidate_state(record.as_ref(), row) else {
            return self.resolution(
                GeographyScope::Global,
                Some(key),
                Some(FallbackReason::NoGeographicMatch),
            );
        };

        match self.gate.evaluate_state(&self.metrics, media_market_reason) {
            Ok(()) => {
                if let Some(advisory) = self.gate.state_advisory(&self.metrics) {
                    debug!("'{}' resolved to state {} with {}", key, state_code, advisory);
                }
                self.resolution(
                    GeographyScope::State {
                        state_code,
                        state_numeric_id,
                    },
                    Some(key),
                    media_market_reason,
                )
            }
            Err(reason) => {
                debug!("'{}' not eligible for state {}: {}", key, state_code, reason);
                self.resolution(GeographyScope::Global, Some(key), Some(reason))
            }
        }
    }

    /// State for the located sub-region: the crosswalk row, else the state
    /// registered for the numeric prefix of the sub-region code.
    fn candidate_state(
        &self,
        record: Option<&SubRegionRecord>,
        row: Option<&CrosswalkRow>,
    ) -> Option<(String, Option<String>)> {
        if let Some(row) = row {
            let numeric_id = (!row.state_numeric_id.is_empty()).then(|| row.state_numeric_id.clone());
            return Some((row.state_code.clone(), numeric_id));
        }

        let prefix = numeric_prefix(&record?.code)?;
        let state_code = self.crosswalk.state_for_numeric_prefix(prefix)?;
        Some((state_code.to_string(), Some(prefix.to_string())))
    }

    fn resolution(
        &self,
        scope: GeographyScope,
        source_geohash: Option<&str>,
        fallback_reason: Option<FallbackReason>,
    ) -> GeographyResolution {
        GeographyResolution {
            scope,
            source_geohash: source_geohash.map(str::to_string),
            geocoded_ratio: self.metrics.geocoded_ratio,
            weather_coverage: self.metrics.weather_coverage,
            fallback_reason,
        }
    }

    pub fn metrics(&self) -> &CoverageMetrics {
        &self.metrics
    }

    pub fn catalog(&self) -> &GeometryCatalog {
        &self.catalog
    }

    pub fn crosswalk(&self) -> &CrosswalkTable {
        &self.crosswalk
    }

    /// Cache counters; every miss is one decode + polygon lookup.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn media_market_scope(record: &SubRegionRecord, row: &CrosswalkRow) -> GeographyScope {
    let sub_region_name = if row.sub_region_name.is_empty() {
        record.name.clone()
    } else {
        row.sub_region_name.clone()
    };

    GeographyScope::MediaMarket {
        code: row.media_market_code.clone(),
        display_name: row.media_market_name.clone(),
        state_code: row.state_code.clone(),
        state_numeric_id: row.state_numeric_id.clone(),
        sub_region_code: row.sub_region_code.clone(),
        sub_region_name,
    }
}
