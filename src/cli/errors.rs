//! CLI-specific error types
//!
//! Every CLI error ends the process with exit code 1.

use std::fmt;
use std::io;

use crate::gateway::QueryError;
use crate::instance::InstanceError;
use crate::runner::RunError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or flag error
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Runtime could not be started
    BootFailed,
    /// Target database unreachable or snapshot unreadable
    GatewayError,
    /// A check failed or exceeded its deadline
    RunFailed,
    /// `explain` was given an unknown check id
    UnknownCheck,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "PGC_CLI_CONFIG_ERROR",
            Self::IoError => "PGC_CLI_IO_ERROR",
            Self::BootFailed => "PGC_CLI_BOOT_FAILED",
            Self::GatewayError => "PGC_CLI_GATEWAY_ERROR",
            Self::RunFailed => "PGC_CLI_RUN_FAILED",
            Self::UnknownCheck => "PGC_CLI_UNKNOWN_CHECK",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Unknown check id
    pub fn unknown_check(check_id: &str) -> Self {
        Self::new(
            CliErrorCode::UnknownCheck,
            format!(
                "Unknown check '{}'. Run 'pgcheckup list' for valid ids.",
                check_id
            ),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        Self::new(CliErrorCode::GatewayError, e.to_string())
    }
}

impl From<InstanceError> for CliError {
    fn from(e: InstanceError) -> Self {
        Self::config_error(format!("Instance metadata: {}", e))
    }
}

impl From<RunError> for CliError {
    fn from(e: RunError) -> Self {
        Self::new(CliErrorCode::RunFailed, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckError;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("check_timeout_secs must be > 0");
        assert_eq!(
            err.to_string(),
            "PGC_CLI_CONFIG_ERROR: check_timeout_secs must be > 0"
        );
    }

    #[test]
    fn test_run_error_conversion() {
        let err: CliError = RunError::Check {
            category: "configs".to_string(),
            check_id: "pg-version".to_string(),
            source: CheckError::Query(QueryError::Connection("reset".to_string())),
        }
        .into();

        assert_eq!(err.code(), &CliErrorCode::RunFailed);
        assert!(err.message().contains("configs/pg-version"));
    }

    #[test]
    fn test_gateway_error_conversion() {
        let err: CliError = QueryError::Connection("refused".to_string()).into();
        assert_eq!(err.code_str(), "PGC_CLI_GATEWAY_ERROR");
    }
}
