//! Pulse CLI - Business metrics and insights
//!
//! Usage:
//!   pulse report --snapshot data.json                 Full dashboard for the last 30 days
//!   pulse report --snapshot data.json -p 7d --narrative
//!   pulse insights --snapshot data.json --from 2026-03-01 --to 2026-03-31
//!   pulse top services --snapshot data.json --limit 3
//!   pulse config --check                              Show config, probe narrative backend

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use pulse_core::DashboardConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = DashboardConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Report { args, narrative } => {
            commands::cmd_report(&args, &config, narrative).await
        }
        Commands::Insights { args } => commands::cmd_insights(&args, &config).await,
        Commands::Top { kind, limit, args } => {
            commands::cmd_top(kind, limit, &args, &config).await
        }
        Commands::Config { check } => commands::cmd_config(&config, check).await,
    }
}
