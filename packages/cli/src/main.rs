#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line runner for urban center shape and density metrics.
//!
//! Loads urban center polygons, a shoreline mask and a population raster,
//! computes compactness, weighted density and density gradient for every
//! center, and writes one row per center as `GeoJSON` or CSV.
//!
//! Uses `indicatif-log-bridge` (via [`urban_metrics_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod load;
mod write;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use urban_metrics::progress::RunProgress;
use urban_metrics::{Pipeline, PipelineInputs};
use urban_metrics_cli_utils::{MultiProgress, PassBars, loading_bar};
use urban_metrics_geometry::ShorelineIndex;
use urban_metrics_models::PipelineConfig;

use crate::load::LoadError;
use crate::write::OutputFormat;

#[derive(Parser)]
#[command(name = "urban_metrics", about = "Shape and density metrics for urban centers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for every urban center
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Urban center polygons (`GeoJSON`)
    #[arg(long)]
    urban_centers: PathBuf,

    /// Land mask polygons (`GeoJSON`)
    #[arg(long)]
    shoreline: PathBuf,

    /// Population raster tile manifest (JSON)
    #[arg(long)]
    raster: PathBuf,

    /// Output file
    #[arg(long)]
    output: PathBuf,

    /// Output format (default: from the output extension)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// TOML run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (default: one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Property holding the urban center id
    #[arg(long)]
    id_field: Option<String>,

    /// PROJ string of the input CRS
    #[arg(long)]
    crs: Option<String>,
}

impl RunArgs {
    /// The config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<PipelineConfig, LoadError> {
        let mut config = match &self.config {
            Some(path) => load::read_config(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(threads) = self.threads {
            config.worker_threads = Some(threads);
        }
        if let Some(id_field) = &self.id_field {
            config.id_field.clone_from(id_field);
        }
        if let Some(crs) = &self.crs {
            config.crs.clone_from(crs);
        }

        Ok(config)
    }

    fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = urban_metrics_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(&args, &multi)?,
    }

    Ok(())
}

fn run(args: &RunArgs, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let config = args.resolve_config()?;

    let loading = loading_bar(multi, 3);
    loading.set_message("urban centers");
    let centers = load::read_urban_centers(&args.urban_centers, &config.id_field)?;
    loading.inc(1);
    loading.set_message("shoreline");
    let shoreline = ShorelineIndex::new(load::read_shoreline(&args.shoreline)?);
    loading.inc(1);
    loading.set_message("population raster");
    let raster = load::read_raster(&args.raster)?;
    loading.inc(1);
    loading.finish_and_clear();

    let inputs = PipelineInputs {
        centers,
        shoreline,
        raster,
    };
    let progress: Arc<dyn RunProgress> = PassBars::new(multi, inputs.centers.len() as u64);
    let rows = Pipeline::new(config).run(&inputs, &progress)?;

    write::write_rows(&rows, &args.output, args.output_format())?;

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
