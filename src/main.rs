//! Campaign Dataviz - marketing campaign CSV cleaning & static charts
//!
//! Loads the campaign dataset, cleans it, derives CTR/CVR/CPC/CPA and renders
//! the summary charts.

mod charts;
mod config;
mod data;
mod error;
mod stats;

use anyhow::Result;
use clap::Parser;
use config::CleanerConfig;
use data::DatasetCleaner;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clean a marketing campaign CSV and render summary charts"
)]
struct Args {
    /// Source CSV file
    #[arg(default_value = "dataset_marketing_dataviz.csv")]
    input: PathBuf,

    /// Write the cleaned table to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory receiving the chart images
    #[arg(long, default_value = "visualisations")]
    charts_dir: PathBuf,

    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,

    /// Write the cleaning report as JSON to this file
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// JSON file overriding column names, date formats or the IQR factor
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<bool> {
    let config = match &args.config {
        Some(path) => CleanerConfig::load(path)?,
        None => CleanerConfig::default(),
    };
    let cleaner = DatasetCleaner::new(config);

    let Some(cleaned) = cleaner.run(&args.input, args.output.as_deref()) else {
        return Ok(false);
    };

    info!(
        "{} duplicate rows removed, {} outliers flagged",
        cleaned.report.duplicates_removed,
        cleaned.report.total_outliers()
    );

    if let Some(path) = &args.report {
        cleaned.report.save_json(path)?;
        info!("Report written to {}", path.display());
    }

    if args.no_charts {
        return Ok(true);
    }

    if !args.charts_dir.exists() {
        fs::create_dir_all(&args.charts_dir)?;
        info!("Created directory {}", args.charts_dir.display());
    }

    match charts::render_all(&cleaned.df, &cleaner.config().schema, &args.charts_dir) {
        Ok(paths) => info!("{} charts written", paths.len()),
        // Charts only consume the cleaned table, so a rendering failure is not fatal.
        Err(e) => warn!("Chart rendering failed: {:#}", e),
    }

    Ok(true)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
