use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coverage::{CoverageMetrics, CoverageThresholds};
use crate::error::CatalogLoadError;
use crate::pip::CatalogProperties;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub crosswalk: CrosswalkConfig,
    #[serde(default)]
    pub coverage: CoverageMetrics,
    #[serde(default)]
    pub thresholds: CoverageThresholds,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub properties: CatalogProperties,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrosswalkConfig {
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl CrosswalkConfig {
    /// The delimiter as a single byte ("\t" is accepted for tabs).
    pub fn delimiter_byte(&self) -> std::result::Result<u8, CatalogLoadError> {
        match self.delimiter.as_str() {
            "\\t" | "\t" => Ok(b'\t'),
            d if d.len() == 1 => Ok(d.as_bytes()[0]),
            d => Err(CatalogLoadError::Config(format!(
                "crosswalk delimiter must be a single byte, got '{}'",
                d
            ))),
        }
    }
}

impl Config {
    /// Load a TOML config. Relative data paths are resolved against the
    /// directory holding the config file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let mut config = Self::from_toml(&content)?;

        if let Some(base) = path.parent() {
            config.catalog.path = base.join(&config.catalog.path);
            config.crosswalk.path = base.join(&config.crosswalk.path);
        }
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }
}
