//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Pulse - Business metrics and insights
#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Business metrics and insight dashboard for service businesses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ~/.local/share/pulse/config.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the full dashboard report
    Report {
        #[command(flatten)]
        args: ReportArgs,

        /// Ask the narrative backend for commentary after the report
        #[arg(long)]
        narrative: bool,
    },

    /// Show only the insights for a period
    Insights {
        #[command(flatten)]
        args: ReportArgs,
    },

    /// Show a single ranking
    Top {
        /// What to rank
        #[arg(value_enum)]
        kind: TopKind,

        /// Number of entries (overrides report.ranking_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        args: ReportArgs,
    },

    /// Show the effective configuration
    Config {
        /// Also check that the narrative backend is reachable
        #[arg(long)]
        check: bool,
    },
}

/// Arguments shared by every report-producing command
#[derive(Args, Clone, Debug)]
pub struct ReportArgs {
    /// Snapshot file (JSON document with one array per collection)
    #[arg(short, long)]
    pub snapshot: PathBuf,

    /// Period: today, 7d, 30d, 90d, or custom (with --from/--to)
    #[arg(short, long, default_value = "30d")]
    pub period: String,

    /// Custom period start (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Custom period end (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Evaluate as of this instant instead of the current time
    #[arg(long)]
    pub now: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TopKind {
    Clients,
    Services,
    Staff,
    Products,
}
