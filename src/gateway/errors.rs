//! # Query Gateway Errors

use thiserror::Error;

/// Result type for gateway queries
pub type QueryResult<T> = Result<T, QueryError>;

/// Failures raised while talking to the target database
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query '{operation}' failed: {message}")]
    Query { operation: String, message: String },

    #[error("Query '{operation}' returned an unreadable '{column}' column: {message}")]
    Decode {
        operation: String,
        column: String,
        message: String,
    },
}

impl QueryError {
    /// Create a query failure for the named gateway operation
    pub fn query(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a decode failure for a column of the named operation
    pub fn decode(
        operation: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Decode {
            operation: operation.into(),
            column: column.into(),
            message: message.into(),
        }
    }
}
