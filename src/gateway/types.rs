//! Row shapes returned by the gateway

use serde::{Deserialize, Serialize};

/// A partitioned table with its key and aggregated scan counters.
///
/// Scan counters are summed over all partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionedTable {
    pub schema: String,
    pub table: String,
    /// Key column names, in key order. Empty for purely expression keys.
    pub partition_key: Vec<String>,
    /// Whether any part of the key is an expression
    pub key_is_expression: bool,
    pub partition_count: i64,
    pub seq_scans: i64,
    pub idx_scans: i64,
}

impl PartitionedTable {
    /// `schema.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// One captured query from pg_stat_statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStatistic {
    pub query: String,
    pub calls: i64,
    /// Cumulative execution time in milliseconds
    pub total_exec_time_ms: f64,
}

/// Scan counters of an ordinary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableScanStats {
    pub schema: String,
    pub table: String,
    pub seq_scans: i64,
    pub idx_scans: i64,
    pub live_rows: i64,
}

impl TableScanStats {
    /// `schema.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// Server-wide connection counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionUsage {
    pub max_connections: i64,
    /// `superuser_reserved_connections` (+ `reserved_connections` on 16+)
    pub reserved_connections: i64,
    /// Client backends currently connected
    pub total: i64,
    /// Client backends in state `active`
    pub active: i64,
}

impl ConnectionUsage {
    /// Connection slots available to ordinary roles
    pub fn available_slots(&self) -> i64 {
        (self.max_connections - self.reserved_connections).max(1)
    }
}
