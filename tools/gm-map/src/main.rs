//! Pipeline driver: builds the station index from per-chunk coordinate
//! files, sweeps the evaluation grid, and writes the metric and
//! station-info field bundles.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gm_core::config::GmConfig;
use gm_core::grid::{GridEvaluator, GridSpec};
use gm_core::index::StationIndex;
use gm_core::resolve::StationResolver;

#[derive(Parser, Debug)]
#[command(
    name = "gm-map",
    about = "Compute ground-motion intensity-measure fields from rupture-simulation surface output"
)]
struct Args {
    /// Directory holding surface_coor.txt<N> and gm<N> chunk files
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    #[arg(long, allow_hyphen_values = true, default_value = "-30000")]
    x_min: f64,

    #[arg(long, allow_hyphen_values = true, default_value = "30000")]
    x_max: f64,

    #[arg(long, allow_hyphen_values = true, default_value = "-30000")]
    y_min: f64,

    #[arg(long, allow_hyphen_values = true, default_value = "30000")]
    y_max: f64,

    /// Grid spacing in metres
    #[arg(long, default_value = "1000", value_parser = parse_spacing)]
    spacing: f64,

    /// Sampling interval of the surface output in seconds
    #[arg(long, default_value = "0.05")]
    dt: f64,

    /// GMRotDpp percentile
    #[arg(long, default_value = "50")]
    percentile: f64,

    /// Chunk ids 0..max-chunks are scanned; absent ids are skipped
    #[arg(long, default_value = "1000")]
    max_chunks: u32,

    /// Output path for the intensity-measure bundle
    #[arg(long, default_value = "gmMetricsValues.json.gz")]
    metrics_out: PathBuf,

    /// Output path for the station-info bundle (Rjb, x, y)
    #[arg(long, default_value = "gmStInfoValues.json.gz")]
    st_info_out: PathBuf,
}

fn parse_spacing(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err("grid spacing must be positive".to_string())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let cfg = GmConfig {
        dt: args.dt,
        percentile: args.percentile,
        max_chunks: args.max_chunks,
        ..GmConfig::default()
    };

    let start = Instant::now();
    let index = StationIndex::build(&args.data_dir, &cfg).context("building station index")?;
    info!(stations = index.records.len(), "station index built");

    let resolver = StationResolver::new(&index, &args.data_dir, &cfg.coord_prefix);
    let evaluator = GridEvaluator::new(&cfg, &resolver);
    let spec = GridSpec {
        x_range: [args.x_min, args.x_max],
        y_range: [args.y_min, args.y_max],
        spacing: args.spacing,
    };

    let out = evaluator.evaluate(&spec).context("grid evaluation")?;

    out.metrics
        .save_gz(&args.metrics_out)
        .with_context(|| format!("writing {}", args.metrics_out.display()))?;
    out.station_info
        .save_gz(&args.st_info_out)
        .with_context(|| format!("writing {}", args.st_info_out.display()))?;

    info!(
        elapsed_s = start.elapsed().as_secs_f64(),
        nodes = spec.nx() * spec.ny(),
        "sweep finished"
    );
    Ok(())
}
