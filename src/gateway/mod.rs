//! Query Gateway
//!
//! The only path from a check to the target database. Each check depends on
//! a narrow role trait naming exactly the queries it issues:
//!
//! - [`PartitionQueries`]: partitioned tables and captured query statistics
//! - [`ScanQueries`]: scan counters of ordinary tables
//! - [`ConnectionQueries`]: connection slot usage
//! - [`SettingsQueries`]: server version and memory settings
//!
//! [`Gateway`] is the superset the runner hands to check constructors.
//! [`PgGateway`] implements it over a single read-only session and
//! [`StaticGateway`] over a captured [`Snapshot`].

mod errors;
mod postgres;
mod snapshot;
pub mod sql;
mod types;

use std::future::Future;
use std::pin::Pin;

pub use errors::{QueryError, QueryResult};
pub use postgres::PgGateway;
pub use snapshot::{Snapshot, StaticGateway};
pub use types::{ConnectionUsage, PartitionedTable, QueryStatistic, TableScanStats};

/// Future returned by every gateway query
pub type QueryFuture<'a, T> = Pin<Box<dyn Future<Output = QueryResult<T>> + Send + 'a>>;

/// Queries used by the partition usage analysis
pub trait PartitionQueries: Send + Sync {
    /// Top-level partitioned tables with keys and summed scan counters
    fn partitioned_tables(&self) -> QueryFuture<'_, Vec<PartitionedTable>>;

    /// Whether pg_stat_statements is installed in the current database
    fn has_query_stats_extension(&self) -> QueryFuture<'_, bool>;

    /// Captured statements of the current database
    fn query_statistics(&self) -> QueryFuture<'_, Vec<QueryStatistic>>;
}

/// Queries used by the sequential scan analysis
pub trait ScanQueries: Send + Sync {
    /// Scan counters of ordinary (non-partition) user tables
    fn table_scan_stats(&self) -> QueryFuture<'_, Vec<TableScanStats>>;
}

/// Queries used by the connection headroom check
pub trait ConnectionQueries: Send + Sync {
    fn connection_usage(&self) -> QueryFuture<'_, ConnectionUsage>;
}

/// Queries used by the configuration checks
pub trait SettingsQueries: Send + Sync {
    /// `server_version_num`, e.g. 160002
    fn server_version_num(&self) -> QueryFuture<'_, i32>;

    /// `shared_buffers` in bytes
    fn shared_buffers_bytes(&self) -> QueryFuture<'_, i64>;
}

/// Every query any registered check may issue
pub trait Gateway: PartitionQueries + ScanQueries + ConnectionQueries + SettingsQueries {}

impl<T> Gateway for T where T: PartitionQueries + ScanQueries + ConnectionQueries + SettingsQueries {}
