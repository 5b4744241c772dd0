//! Partition key usage
//!
//! Partitioned tables only pay off when queries name the partition key.
//! This check combines the scan counters of every partitioned table with
//! the statements captured by pg_stat_statements.

use std::sync::Arc;

use crate::analyzer::partition_usage::analyze_key_usage;
use crate::analyzer::scan_ratio::{scan_ratio_finding, ScanSubject};
use crate::check::{CheckFuture, CheckMetadata, CheckResult, Checker, Finding, Report, Severity};
use crate::gateway::{sql, PartitionQueries};
use crate::registry::CheckDeps;

pub const CHECK_ID: &str = "partition-usage";
pub const TABLES_FINDING_ID: &str = "partitioned-tables";
pub const SEQ_SCANS_FINDING_ID: &str = "partition-seq-scans";
pub const QUERY_PATTERNS_FINDING_ID: &str = "query-patterns";

const README: &str = "\
Queries against a partitioned table can skip partitions only when they
constrain the partition key. Queries that do not are planned against every
partition, which grows worse with each partition added.

The check reports:
- partition-seq-scans: partitioned tables read mostly by sequential scans
- partition-key-filter: frequent queries that never constrain the key;
  plain queries are judged on their WHERE clause, JOINs on their FROM list
- partition-key-join: frequent JOINs that never reference the key

Query analysis needs the pg_stat_statements extension in the current
database. Tables partitioned by an expression are listed but not analyzed.";

pub fn metadata() -> CheckMetadata {
    CheckMetadata {
        check_id: CHECK_ID,
        name: "Partition key usage",
        category: "schema",
        description: "Finds partitioned tables whose queries cannot prune partitions",
        sql: sql::PARTITIONED_TABLES,
        readme: README,
    }
}

pub fn build(deps: &CheckDeps) -> Box<dyn Checker> {
    Box::new(PartitionUsageCheck::new(Arc::clone(&deps.gateway)))
}

pub struct PartitionUsageCheck<Q: ?Sized> {
    queries: Arc<Q>,
}

impl<Q: PartitionQueries + ?Sized> PartitionUsageCheck<Q> {
    pub fn new(queries: Arc<Q>) -> Self {
        Self { queries }
    }

    async fn evaluate(&self) -> CheckResult<Report> {
        let mut report = Report::new(metadata());

        let tables = self.queries.partitioned_tables().await?;
        if tables.is_empty() {
            report.add_finding(Finding::new(
                TABLES_FINDING_ID,
                "Partitioned tables",
                Severity::Ok,
                "No partitioned tables found.",
            ));
            return Ok(report);
        }

        report.add_finding(scan_ratio_finding(
            SEQ_SCANS_FINDING_ID,
            "Sequential scans on partitioned tables",
            tables.iter().map(|t| ScanSubject {
                name: t.qualified_name(),
                seq_scans: t.seq_scans,
                idx_scans: t.idx_scans,
            }),
        ));

        if !self.queries.has_query_stats_extension().await? {
            report.add_finding(Finding::new(
                QUERY_PATTERNS_FINDING_ID,
                "Query patterns",
                Severity::Warn,
                "pg_stat_statements is not installed in this database, \
                 cannot analyze query patterns against partition keys.",
            ));
            return Ok(report);
        }

        let stats = self.queries.query_statistics().await?;
        if stats.is_empty() {
            report.add_finding(Finding::new(
                QUERY_PATTERNS_FINDING_ID,
                "Query patterns",
                Severity::Ok,
                "pg_stat_statements is installed but no query statistics available yet.",
            ));
            return Ok(report);
        }

        let findings = analyze_key_usage(&tables, &stats)?;
        report.add_finding(findings.filter);
        report.add_finding(findings.join);

        Ok(report)
    }
}

impl<Q: PartitionQueries + ?Sized> Checker for PartitionUsageCheck<Q> {
    fn metadata(&self) -> CheckMetadata {
        metadata()
    }

    fn check(&self) -> CheckFuture<'_> {
        Box::pin(self.evaluate())
    }
}
