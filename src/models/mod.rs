//! Core data models for geographic resolution.

pub mod region;
pub mod resolution;

pub use region::{CrosswalkRow, GeoPoint, SubRegionRecord};
pub use resolution::{FallbackReason, GeographyLevel, GeographyResolution, GeographyScope};
