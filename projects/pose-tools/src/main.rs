mod cli;
mod pipeline;
mod pose;
mod run_context;
mod video;

use anyhow::Result;
use cli::{Args, Command};
use pipeline::extract::extract_folder;
use pipeline::split::split_folder;
use pose::BlazePoseEstimator;

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();

    match args.command {
        Command::Extract(extract) => {
            let config = extract.into_config()?;
            let mut estimator = BlazePoseEstimator::new(config.pose.clone())?;
            extract_folder(&config, &mut estimator)?;
        }
        Command::Split(split) => {
            split_folder(&split.into_config())?;
        }
    }

    Ok(())
}
