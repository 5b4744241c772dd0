//! Health severity levels

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered health level of a finding or report.
///
/// `Ok < Warn < Fail`; aggregation always keeps the worse value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing to act on
    #[default]
    Ok,
    /// Worth a look, not urgent
    Warn,
    /// Needs action
    Fail,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Fail => "FAIL",
        }
    }

    /// Returns the worse of the two severities
    pub fn worst(self, other: Severity) -> Severity {
        self.max(other)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
