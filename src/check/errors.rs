//! # Check Errors

use thiserror::Error;

use crate::gateway::QueryError;

/// Result type for check execution
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors a check can raise while executing.
///
/// Checks never recover from these locally; the runner wraps them with the
/// failing check's identity and aborts the run.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),
}
