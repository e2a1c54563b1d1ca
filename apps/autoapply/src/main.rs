mod agent;
mod automation;
mod cli;
mod config;
mod discovery;
mod errors;
mod models;
mod orchestrator;
mod resume;
mod scoring;
mod sources;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::EnvSettings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = EnvSettings::from_env();

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &env.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting autoapply v{}", env!("CARGO_PKG_VERSION"));

    cli::run(cli).await
}
