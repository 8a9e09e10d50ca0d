use std::path::PathBuf;
use thiserror::Error;

/// Construction-time failure while loading the polygon catalog, the
/// crosswalk table or the configuration that points at them.
#[derive(Error, Debug)]
pub enum CatalogLoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid GeoJSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid crosswalk data: {0}")]
    Csv(#[from] csv::Error),
    #[error("Crosswalk column '{0}' not found")]
    MissingColumn(&'static str),
    #[error("No usable polygons in {}", .0.display())]
    EmptyCatalog(PathBuf),
    #[error("No usable crosswalk rows in {}", .0.display())]
    EmptyCrosswalk(PathBuf),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CatalogLoadError>;
