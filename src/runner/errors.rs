//! # Run Errors
//!
//! Every error carries the category and id of the check that aborted the
//! run.

use std::time::Duration;

use thiserror::Error;

use crate::check::CheckError;

/// Result type for a run
pub type RunResult<T> = Result<T, RunError>;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("check {category}/{check_id} failed: {source}")]
    Check {
        category: String,
        check_id: String,
        source: CheckError,
    },

    #[error("check {category}/{check_id} exceeded its deadline of {timeout:?}")]
    Timeout {
        category: String,
        check_id: String,
        timeout: Duration,
    },
}

impl RunError {
    /// Whether the run was aborted by a deadline rather than a failed query
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunError::Timeout { .. })
    }

    pub fn check_id(&self) -> &str {
        match self {
            RunError::Check { check_id, .. } | RunError::Timeout { check_id, .. } => check_id,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            RunError::Check { category, .. } | RunError::Timeout { category, .. } => category,
        }
    }
}
