//! pgcheckup CLI entry point
//!
//! Parses arguments and dispatches via `cli::run`, then maps the outcome to
//! an exit code:
//! - 0: every report is OK or WARN
//! - 2: at least one report is FAIL
//! - 1: the run (or the CLI itself) failed

use pgcheckup::cli;

fn main() {
    match cli::run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
