//! Geotier - coverage-aware geographic resolution
//!
//! Resolves a geohash to a media market (DMA), a state, or a global
//! catch-all depending on how trustworthy the surrounding coverage data is.

pub mod config;
pub mod coverage;
pub mod crosswalk;
pub mod error;
pub mod geohash;
pub mod models;
pub mod pip;
pub mod resolver;

pub use coverage::{CoverageGate, CoverageMetrics, CoverageThresholds};
pub use crosswalk::CrosswalkTable;
pub use error::CatalogLoadError;
pub use models::{FallbackReason, GeoPoint, GeographyLevel, GeographyResolution, GeographyScope};
pub use pip::GeometryCatalog;
pub use resolver::Resolver;
