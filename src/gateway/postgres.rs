//! tokio-postgres backed gateway
//!
//! Opens one session, switches it to read-only and serves every role trait
//! from it. Queries run one at a time, matching the sequential runner.

use tokio_postgres::types::FromSql;
use tokio_postgres::{Client, NoTls, Row};

use crate::observability::{log_event_with_fields, Event, Logger};

use super::errors::{QueryError, QueryResult};
use super::sql;
use super::types::{ConnectionUsage, PartitionedTable, QueryStatistic, TableScanStats};
use super::{ConnectionQueries, PartitionQueries, QueryFuture, ScanQueries, SettingsQueries};

/// Gateway over a single read-only PostgreSQL session
pub struct PgGateway {
    client: Client,
}

impl PgGateway {
    /// Connect and mark the session read-only.
    ///
    /// The connection driver runs on a spawned task; it ends when the
    /// gateway (and with it the client) is dropped.
    pub async fn connect(database_url: &str) -> QueryResult<Self> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| QueryError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                Logger::error("GATEWAY_CONNECTION_LOST", &[("error", e.to_string().as_str())]);
            }
        });

        client
            .batch_execute("SET default_transaction_read_only = on")
            .await
            .map_err(|e| QueryError::Connection(e.to_string()))?;

        log_event_with_fields(Event::GatewayConnected, &[("read_only", "true")]);

        Ok(Self { client })
    }

    async fn query_rows(&self, operation: &str, sql: &str) -> QueryResult<Vec<Row>> {
        self.client
            .query(sql, &[])
            .await
            .map_err(|e| QueryError::query(operation, e.to_string()))
    }

    async fn query_one(&self, operation: &str, sql: &str) -> QueryResult<Row> {
        self.client
            .query_one(sql, &[])
            .await
            .map_err(|e| QueryError::query(operation, e.to_string()))
    }

    async fn fetch_partitioned_tables(&self) -> QueryResult<Vec<PartitionedTable>> {
        const OP: &str = "partitioned_tables";
        let rows = self.query_rows(OP, sql::PARTITIONED_TABLES).await?;
        rows.iter()
            .map(|row| {
                Ok(PartitionedTable {
                    schema: column(row, OP, "schema_name")?,
                    table: column(row, OP, "table_name")?,
                    partition_key: column(row, OP, "key_columns")?,
                    key_is_expression: column(row, OP, "key_is_expression")?,
                    partition_count: column(row, OP, "partition_count")?,
                    seq_scans: column(row, OP, "seq_scans")?,
                    idx_scans: column(row, OP, "idx_scans")?,
                })
            })
            .collect()
    }

    async fn fetch_has_query_stats_extension(&self) -> QueryResult<bool> {
        const OP: &str = "has_query_stats_extension";
        let row = self.query_one(OP, sql::HAS_QUERY_STATS_EXTENSION).await?;
        column(&row, OP, "installed")
    }

    async fn fetch_query_statistics(&self) -> QueryResult<Vec<QueryStatistic>> {
        const OP: &str = "query_statistics";
        let version_num = self.fetch_server_version_num().await?;
        let rows = self
            .query_rows(OP, sql::query_statistics_for(version_num))
            .await?;
        let mut stats = Vec::with_capacity(rows.len());
        for row in &rows {
            // NULL for statements of other roles without pg_read_all_stats
            let query: Option<String> = column(row, OP, "query")?;
            if let Some(query) = query {
                stats.push(QueryStatistic {
                    query,
                    calls: column(row, OP, "calls")?,
                    total_exec_time_ms: column(row, OP, "total_exec_time")?,
                });
            }
        }
        Ok(stats)
    }

    async fn fetch_table_scan_stats(&self) -> QueryResult<Vec<TableScanStats>> {
        const OP: &str = "table_scan_stats";
        let rows = self.query_rows(OP, sql::TABLE_SCAN_STATS).await?;
        rows.iter()
            .map(|row| {
                Ok(TableScanStats {
                    schema: column(row, OP, "schema_name")?,
                    table: column(row, OP, "table_name")?,
                    seq_scans: column(row, OP, "seq_scans")?,
                    idx_scans: column(row, OP, "idx_scans")?,
                    live_rows: column(row, OP, "live_rows")?,
                })
            })
            .collect()
    }

    async fn fetch_connection_usage(&self) -> QueryResult<ConnectionUsage> {
        const OP: &str = "connection_usage";
        let row = self.query_one(OP, sql::CONNECTION_USAGE).await?;
        Ok(ConnectionUsage {
            max_connections: column(&row, OP, "max_connections")?,
            reserved_connections: column(&row, OP, "reserved_connections")?,
            total: column(&row, OP, "total")?,
            active: column(&row, OP, "active")?,
        })
    }

    async fn fetch_server_version_num(&self) -> QueryResult<i32> {
        const OP: &str = "server_version_num";
        let row = self.query_one(OP, sql::SERVER_VERSION_NUM).await?;
        column(&row, OP, "version_num")
    }

    async fn fetch_shared_buffers_bytes(&self) -> QueryResult<i64> {
        const OP: &str = "shared_buffers_bytes";
        let row = self.query_one(OP, sql::SHARED_BUFFERS_BYTES).await?;
        column(&row, OP, "bytes")
    }
}

/// Read a column, naming the operation and column on failure
fn column<'a, T: FromSql<'a>>(row: &'a Row, operation: &str, name: &str) -> QueryResult<T> {
    row.try_get(name)
        .map_err(|e| QueryError::decode(operation, name, e.to_string()))
}

impl PartitionQueries for PgGateway {
    fn partitioned_tables(&self) -> QueryFuture<'_, Vec<PartitionedTable>> {
        Box::pin(self.fetch_partitioned_tables())
    }

    fn has_query_stats_extension(&self) -> QueryFuture<'_, bool> {
        Box::pin(self.fetch_has_query_stats_extension())
    }

    fn query_statistics(&self) -> QueryFuture<'_, Vec<QueryStatistic>> {
        Box::pin(self.fetch_query_statistics())
    }
}

impl ScanQueries for PgGateway {
    fn table_scan_stats(&self) -> QueryFuture<'_, Vec<TableScanStats>> {
        Box::pin(self.fetch_table_scan_stats())
    }
}

impl ConnectionQueries for PgGateway {
    fn connection_usage(&self) -> QueryFuture<'_, ConnectionUsage> {
        Box::pin(self.fetch_connection_usage())
    }
}

impl SettingsQueries for PgGateway {
    fn server_version_num(&self) -> QueryFuture<'_, i32> {
        Box::pin(self.fetch_server_version_num())
    }

    fn shared_buffers_bytes(&self) -> QueryFuture<'_, i64> {
        Box::pin(self.fetch_shared_buffers_bytes())
    }
}
