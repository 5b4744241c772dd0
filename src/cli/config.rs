//! Configuration file
//!
//! A JSON document; every field is optional. Flags of `pgcheckup run`
//! override file values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observability::LogLevel;
use crate::runner::DEFAULT_CHECK_TIMEOUT;

use super::args::RunArgs;
use super::errors::{CliError, CliResult};
use super::output::OutputFormat;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Connection string of the target database
    #[serde(default)]
    pub database_url: Option<String>,

    /// Per-check deadline in seconds (optional, default 30)
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,

    /// Whole-run deadline in seconds (optional, unbounded by default)
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    /// Path to the instance metadata JSON file
    #[serde(default)]
    pub instance_metadata: Option<PathBuf>,

    /// Filters selecting checks to run
    #[serde(default)]
    pub only: Vec<String>,

    /// Filters selecting checks to skip
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub format: OutputFormat,

    /// Minimum log level: "trace", "info", "warn" or "error"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_check_timeout_secs() -> u64 {
    DEFAULT_CHECK_TIMEOUT.as_secs()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            check_timeout_secs: default_check_timeout_secs(),
            run_timeout_secs: None,
            instance_metadata: None,
            only: Vec::new(),
            ignore: Vec::new(),
            format: OutputFormat::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// File configuration (or defaults without `--config`) with the flags
    /// of `args` applied on top
    pub fn resolve(args: &RunArgs) -> CliResult<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_args(&mut self, args: &RunArgs) {
        if let Some(url) = &args.database_url {
            self.database_url = Some(url.clone());
        }
        if let Some(secs) = args.check_timeout_secs {
            self.check_timeout_secs = secs;
        }
        if let Some(secs) = args.run_timeout_secs {
            self.run_timeout_secs = Some(secs);
        }
        if let Some(path) = &args.instance_metadata {
            self.instance_metadata = Some(path.clone());
        }
        if !args.only.is_empty() {
            self.only = args.only.clone();
        }
        if !args.ignore.is_empty() {
            self.ignore = args.ignore.clone();
        }
        if let Some(format) = args.format {
            self.format = format;
        }
        if args.verbose {
            self.log_level = "info".to_string();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.check_timeout_secs == 0 {
            return Err(CliError::config_error("check_timeout_secs must be > 0"));
        }

        if self.run_timeout_secs == Some(0) {
            return Err(CliError::config_error("run_timeout_secs must be > 0"));
        }

        if let Some(url) = &self.database_url {
            if url.trim().is_empty() {
                return Err(CliError::config_error("database_url must not be empty"));
            }
        }

        self.min_log_level()?;

        Ok(())
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }

    /// Parsed `log_level`
    pub fn min_log_level(&self) -> CliResult<LogLevel> {
        match self.log_level.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn or error.",
                other
            ))),
        }
    }
}
