//! Read-only SQL issued by [`PgGateway`](super::PgGateway)
//!
//! Check metadata points at these constants so that `explain` shows the
//! exact text that runs.

pub const PARTITIONED_TABLES: &str = "\
SELECT n.nspname AS schema_name,
       c.relname AS table_name,
       COALESCE(
           array_agg(a.attname::text ORDER BY k.ord) FILTER (WHERE a.attname IS NOT NULL),
           '{}'::text[]
       ) AS key_columns,
       COALESCE(bool_or(k.attnum = 0), false) AS key_is_expression,
       (SELECT count(*) FROM pg_inherits i WHERE i.inhparent = c.oid) AS partition_count,
       (SELECT COALESCE(sum(s.seq_scan), 0)::bigint
          FROM pg_inherits i
          JOIN pg_stat_user_tables s ON s.relid = i.inhrelid
         WHERE i.inhparent = c.oid) AS seq_scans,
       (SELECT COALESCE(sum(s.idx_scan), 0)::bigint
          FROM pg_inherits i
          JOIN pg_stat_user_tables s ON s.relid = i.inhrelid
         WHERE i.inhparent = c.oid) AS idx_scans
  FROM pg_partitioned_table pt
  JOIN pg_class c ON c.oid = pt.partrelid
  JOIN pg_namespace n ON n.oid = c.relnamespace
 CROSS JOIN LATERAL unnest(pt.partattrs::int2[]) WITH ORDINALITY AS k(attnum, ord)
  LEFT JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum AND k.attnum <> 0
 WHERE NOT c.relispartition
   AND n.nspname NOT IN ('pg_catalog', 'information_schema')
 GROUP BY n.nspname, c.relname, c.oid
 ORDER BY 1, 2";

pub const HAS_QUERY_STATS_EXTENSION: &str = "\
SELECT EXISTS (
    SELECT 1 FROM pg_extension WHERE extname = 'pg_stat_statements'
) AS installed";

// total_exec_time exists from PostgreSQL 13 on.
pub const QUERY_STATISTICS: &str = "\
SELECT query, calls, total_exec_time
  FROM pg_stat_statements
 WHERE calls > 0
   AND dbid = (SELECT oid FROM pg_database WHERE datname = current_database())
 ORDER BY total_exec_time DESC
 LIMIT 5000";

/// Same rows as [`QUERY_STATISTICS`] for servers before PostgreSQL 13
pub const QUERY_STATISTICS_PRE_13: &str = "\
SELECT query, calls, total_time AS total_exec_time
  FROM pg_stat_statements
 WHERE calls > 0
   AND dbid = (SELECT oid FROM pg_database WHERE datname = current_database())
 ORDER BY total_time DESC
 LIMIT 5000";

/// Query statistics text matching the server's pg_stat_statements columns
pub fn query_statistics_for(server_version_num: i32) -> &'static str {
    if server_version_num < 130000 {
        QUERY_STATISTICS_PRE_13
    } else {
        QUERY_STATISTICS
    }
}

pub const TABLE_SCAN_STATS: &str = "\
SELECT s.schemaname AS schema_name,
       s.relname AS table_name,
       COALESCE(s.seq_scan, 0) AS seq_scans,
       COALESCE(s.idx_scan, 0) AS idx_scans,
       COALESCE(s.n_live_tup, 0) AS live_rows
  FROM pg_stat_user_tables s
  JOIN pg_class c ON c.oid = s.relid
 WHERE NOT c.relispartition
 ORDER BY s.seq_scan DESC NULLS LAST";

pub const CONNECTION_USAGE: &str = "\
SELECT current_setting('max_connections')::bigint AS max_connections,
       current_setting('superuser_reserved_connections')::bigint
         + COALESCE(current_setting('reserved_connections', true)::bigint, 0) AS reserved_connections,
       count(*) FILTER (WHERE backend_type = 'client backend') AS total,
       count(*) FILTER (WHERE backend_type = 'client backend' AND state = 'active') AS active
  FROM pg_stat_activity";

pub const SERVER_VERSION_NUM: &str = "\
SELECT current_setting('server_version_num')::int AS version_num";

pub const SHARED_BUFFERS_BYTES: &str = "\
SELECT setting::bigint * pg_size_bytes(unit) AS bytes
  FROM pg_settings
 WHERE name = 'shared_buffers'";
