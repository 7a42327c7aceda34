mod activation;
mod api_client;
mod batch;
mod config;
mod creatives;
mod error;
mod models;
mod processor;
mod runner;
mod targeting;

use clap::Parser;
use config::{Config, Job};
use error::Error;
use log::{error, info};

/// Uploads the videos listed in a CSV to DCM and creates one geo-targeted ad
/// per video inside a single placement.
///
/// Ads that could be created are listed in the success file, rows that could
/// not be processed are listed with the reason in the failure file.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(flatten)]
    job: Job,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match runner::upload_videos(args.config, args.job).await {
        Ok(report) => info!(
            "Done: {} ads created, {} rows failed",
            report.successes.len(),
            report.failures.len()
        ),
        Err(err) => {
            error!("failed to upload videos: {}", err);
            std::process::exit(1);
        }
    }

    Ok(())
}
