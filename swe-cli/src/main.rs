//! SWE CLI - Chart the monthly surface water extent of a region from Earth Engine.

use clap::Parser;
use log::LevelFilter;
use swe_cmd::{config::Config, RunArgs, RunOptions};
use swe_ee::auth::ApplicationDefault;

#[derive(Parser)]
#[command(
    name = "swe-cli",
    version,
    about = "Surface water extent time series from the JRC Global Surface Water dataset"
)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.run.debug {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = Config::load(&cli.run.config)?;
    swe_cmd::run(&config, &ApplicationDefault::new(), RunOptions::default()).await?;
    Ok(())
}
