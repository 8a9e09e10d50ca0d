//! Command-line region resolver.
//!
//! Resolves geohashes given as arguments (or one per line on stdin) and
//! prints one JSON resolution per line.

use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geotier::config::Config;
use geotier::coverage::CoverageMetrics;
use geotier::resolver::Resolver;

#[derive(Parser, Debug)]
#[command(name = "resolve")]
#[command(about = "Resolve geohashes to media market, state or global regions")]
struct Args {
    /// TOML config with catalog and crosswalk locations
    #[arg(short, long, default_value = "geotier.toml")]
    config: PathBuf,

    /// Fraction of source records with a valid location (overrides config)
    #[arg(long)]
    geocoded_ratio: Option<f64>,

    /// Fraction of the reporting window with weather signal (overrides config)
    #[arg(long)]
    weather_coverage: Option<f64>,

    /// Geohashes to resolve; read from stdin when empty
    geohashes: Vec<String>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let geocoded_ratio = args.geocoded_ratio.or(config.coverage.geocoded_ratio);
    let weather_coverage = args.weather_coverage.or(config.coverage.weather_coverage);
    for ratio in [geocoded_ratio, weather_coverage].into_iter().flatten() {
        if !(0.0..=1.0).contains(&ratio) {
            anyhow::bail!("Coverage ratios must be within [0, 1], got {}", ratio);
        }
    }
    let metrics = CoverageMetrics::new(geocoded_ratio, weather_coverage);

    let resolver = Resolver::from_config_with_metrics(&config, metrics)
        .context("Failed to build resolver")?;

    let geohashes = if args.geohashes.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("Failed to read geohashes from stdin")?
    } else {
        args.geohashes
    };

    let results = resolver.lookup_many(&geohashes);

    let mut out = BufWriter::new(io::stdout().lock());
    for resolution in &results {
        serde_json::to_writer(&mut out, resolution)?;
        writeln!(out)?;
    }
    out.flush()?;

    let stats = resolver.stats();
    info!(
        "Resolved {} geohashes ({} unique, {} cache hits)",
        results.len(),
        stats.entries,
        stats.hits
    );

    Ok(())
}
