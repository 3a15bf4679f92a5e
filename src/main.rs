mod auth;
mod cli;
mod config;
mod error;
mod render;
mod report;
mod retention;
mod sources;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting cohortlens - cohort retention analytics");
    cli.execute().await?;

    Ok(())
}
