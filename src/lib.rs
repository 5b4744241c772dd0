//! pgcheckup - read-only PostgreSQL health checks
//!
//! Runs a registry of diagnostic checks against a PostgreSQL instance and
//! reports findings with graded severity (OK < WARN < FAIL).

pub mod analyzer;
pub mod check;
pub mod checks;
pub mod cli;
pub mod gateway;
pub mod instance;
pub mod observability;
pub mod registry;
pub mod runner;
