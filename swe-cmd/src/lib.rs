//! Command implementation for the surface water extent CLI.
//!
//! One run walks `Authenticate → Request → Render`; each step is terminal
//! on failure.

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use clap::Args;
use log::info;
use std::path::PathBuf;
use swe_data::Region;
use swe_ee::{
    auth::Authenticator,
    session::{Session, SessionOptions},
    water_area::WaterAreaQuery,
};

pub mod config;
pub mod report;

use config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the INI configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Increase log verbosity (-d debug, -dd trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub session: SessionOptions,
    /// Timestamp used for the output file suffix.
    pub now: NaiveDateTime,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            session: SessionOptions::default(),
            now: Local::now().naive_local(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub chart_path: PathBuf,
    pub csv_path: Option<PathBuf>,
    pub observations: usize,
    pub gaps: usize,
}

/// Load the region, fetch the monthly series and write the report.
pub async fn run<A: Authenticator>(
    config: &Config,
    authenticator: &A,
    options: RunOptions,
) -> anyhow::Result<RunSummary> {
    let region = Region::load(&config.geojson_file)
        .with_context(|| format!("Failed to load region from {}", config.geojson_file.display()))?;
    info!(
        "Loaded region from {} ({} polygons, ~{:.0} m²)",
        config.geojson_file.display(),
        region.shape().0.len(),
        region.area_m2()
    );
    if let Some(extent) = region.bounding_box() {
        info!(
            "Region extent: lon {:.4}..{:.4}, lat {:.4}..{:.4}",
            extent.min().x,
            extent.max().x,
            extent.min().y,
            extent.max().y
        );
    }

    let session = Session::establish(&config.project_id, authenticator, options.session)
        .await
        .context("Failed to initialize Earth Engine")?;

    let query =
        WaterAreaQuery::new(region, config.date_range).with_collection(&config.collection_id);
    let series = query
        .request(&session)
        .await
        .context("Water area computation failed")?;

    let (chart_path, format) = report::chart_path(&config.output_file_base, options.now);
    // the series is kept even when the chart cannot be drawn
    let csv_path = if config.export_csv {
        let path = report::write_csv(&series, &chart_path)?;
        println!("Series saved to {}", path.display());
        Some(path)
    } else {
        None
    };
    report::write_chart(&series, &config.date_range, &chart_path, format)?;
    println!("Chart saved to {}", chart_path.display());

    Ok(RunSummary {
        chart_path,
        csv_path,
        observations: series.len(),
        gaps: series.gaps(),
    })
}
