//! CLI module for pgcheckup
//!
//! Provides command-line interface for:
//! - run: execute the selected checks and print their reports
//! - list: print every accepted filter
//! - explain: print a check's documentation

mod args;
mod commands;
mod config;
mod errors;
mod io;
mod output;

pub use args::{Cli, Command, RunArgs};
pub use commands::{execute, explain, list, run, run_checks, run_command, select, Selection};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use output::{filter_entries, render_text, summary_line, FilterEntry, OutputFormat, RunDocument};
