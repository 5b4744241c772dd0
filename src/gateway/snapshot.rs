//! Gateway over captured data
//!
//! [`StaticGateway`] answers every query from a [`Snapshot`], a JSON
//! document holding the rows the live queries would return. It lets a
//! captured instance be evaluated offline and backs the test suites.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{QueryError, QueryResult};
use super::types::{ConnectionUsage, PartitionedTable, QueryStatistic, TableScanStats};
use super::{
    ConnectionQueries, PartitionQueries, QueryFuture, ScanQueries, SettingsQueries,
};

/// Captured query results. Scalars that were not captured are `None` and
/// make the corresponding query fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub partitioned_tables: Vec<PartitionedTable>,
    pub query_stats_extension: bool,
    pub query_statistics: Vec<QueryStatistic>,
    pub table_scan_stats: Vec<TableScanStats>,
    pub connection_usage: Option<ConnectionUsage>,
    pub server_version_num: Option<i32>,
    pub shared_buffers_bytes: Option<i64>,
}

impl Snapshot {
    /// Load from a JSON file
    pub fn load(path: &Path) -> QueryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            QueryError::Connection(format!("cannot read snapshot {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| QueryError::Connection(format!("invalid snapshot JSON: {}", e)))
    }
}

/// Gateway serving a fixed [`Snapshot`]
#[derive(Debug, Clone, Default)]
pub struct StaticGateway {
    snapshot: Arc<Snapshot>,
}

impl StaticGateway {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

fn ready<'a, T: Send + 'a>(result: QueryResult<T>) -> QueryFuture<'a, T> {
    Box::pin(std::future::ready(result))
}

fn captured<T>(value: Option<T>, operation: &str) -> QueryResult<T> {
    value.ok_or_else(|| QueryError::query(operation, "not captured in snapshot"))
}

impl PartitionQueries for StaticGateway {
    fn partitioned_tables(&self) -> QueryFuture<'_, Vec<PartitionedTable>> {
        ready(Ok(self.snapshot.partitioned_tables.clone()))
    }

    fn has_query_stats_extension(&self) -> QueryFuture<'_, bool> {
        ready(Ok(self.snapshot.query_stats_extension))
    }

    fn query_statistics(&self) -> QueryFuture<'_, Vec<QueryStatistic>> {
        ready(Ok(self.snapshot.query_statistics.clone()))
    }
}

impl ScanQueries for StaticGateway {
    fn table_scan_stats(&self) -> QueryFuture<'_, Vec<TableScanStats>> {
        ready(Ok(self.snapshot.table_scan_stats.clone()))
    }
}

impl ConnectionQueries for StaticGateway {
    fn connection_usage(&self) -> QueryFuture<'_, ConnectionUsage> {
        ready(captured(self.snapshot.connection_usage, "connection_usage"))
    }
}

impl SettingsQueries for StaticGateway {
    fn server_version_num(&self) -> QueryFuture<'_, i32> {
        ready(captured(self.snapshot.server_version_num, "server_version_num"))
    }

    fn shared_buffers_bytes(&self) -> QueryFuture<'_, i64> {
        ready(captured(self.snapshot.shared_buffers_bytes, "shared_buffers_bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_serves_snapshot_rows() {
        let gateway = StaticGateway::new(Snapshot {
            query_stats_extension: true,
            server_version_num: Some(160002),
            ..Default::default()
        });

        assert!(gateway.has_query_stats_extension().await.unwrap());
        assert_eq!(gateway.server_version_num().await.unwrap(), 160002);
        assert!(gateway.partitioned_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_scalar_is_query_error() {
        let gateway = StaticGateway::default();
        let err = gateway.shared_buffers_bytes().await.unwrap_err();
        assert!(matches!(err, QueryError::Query { .. }));
        assert!(err.to_string().contains("shared_buffers_bytes"));
    }

    #[test]
    fn test_load_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "partitioned_tables": [{{
                    "schema": "public", "table": "orders",
                    "partition_key": ["created_at"], "key_is_expression": false,
                    "partition_count": 12, "seq_scans": 10, "idx_scans": 900
                }}],
                "query_stats_extension": true,
                "query_statistics": [
                    {{"query": "select 1", "calls": 3, "total_exec_time_ms": 0.5}}
                ]
            }}"#
        )
        .unwrap();

        let snapshot = Snapshot::load(file.path()).unwrap();
        assert_eq!(snapshot.partitioned_tables[0].table, "orders");
        assert_eq!(snapshot.query_statistics.len(), 1);
        assert!(snapshot.connection_usage.is_none());
    }

    #[test]
    fn test_load_invalid_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();
        assert!(Snapshot::load(file.path()).is_err());
    }
}
