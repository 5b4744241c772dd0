//! CLI argument definitions using clap
//!
//! Commands:
//! - pgcheckup run [--config <path>] [--database-url <url>] [--only <filter>]...
//! - pgcheckup list
//! - pgcheckup explain <check-id>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::output::OutputFormat;

/// pgcheckup - read-only health checks for PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "pgcheckup")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the selected checks and print their reports
    Run(RunArgs),

    /// List every check id and category accepted as a filter
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the description, SQL and documentation of a check
    Explain {
        /// Check id, as printed by `pgcheckup list`
        check_id: String,
    },
}

/// Flags of `pgcheckup run`. Every flag overrides the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Connection string of the target database
    #[arg(long)]
    pub database_url: Option<String>,

    /// Evaluate a captured JSON snapshot instead of a live database
    #[arg(long, conflicts_with = "database_url")]
    pub snapshot: Option<PathBuf>,

    /// Only run checks matching this id or category (repeatable)
    #[arg(long = "only", value_name = "FILTER")]
    pub only: Vec<String>,

    /// Skip checks matching this id or category (repeatable)
    #[arg(long = "ignore", value_name = "FILTER")]
    pub ignore: Vec<String>,

    /// JSON file describing the host (vCPUs, memory, ...)
    #[arg(long)]
    pub instance_metadata: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Deadline of each check, in seconds
    #[arg(long)]
    pub check_timeout_secs: Option<u64>,

    /// Deadline of the whole run, in seconds
    #[arg(long)]
    pub run_timeout_secs: Option<u64>,

    /// Log lifecycle events at INFO level
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
