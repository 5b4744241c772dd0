//! Sequential scan ratio of ordinary tables

use std::sync::Arc;

use crate::analyzer::scan_ratio::{scan_ratio_finding, ScanSubject};
use crate::analyzer::thresholds::MIN_LIVE_ROWS_FOR_SCAN_CHECK;
use crate::check::{CheckFuture, CheckMetadata, CheckResult, Checker, Report};
use crate::gateway::{sql, ScanQueries};
use crate::registry::CheckDeps;

pub const CHECK_ID: &str = "sequential-scans";
pub const FINDING_ID: &str = "seq-scan-ratio";

const README: &str = "\
A table that is mostly read by sequential scans is either missing an index
or queried with predicates that cannot use one. Small tables are excluded:
scanning them sequentially is usually the cheapest plan.

Partitions are excluded; partitioned tables are covered by partition-usage.";

pub fn metadata() -> CheckMetadata {
    CheckMetadata {
        check_id: CHECK_ID,
        name: "Sequential scans",
        category: "performance",
        description: "Flags large tables read mostly through sequential scans",
        sql: sql::TABLE_SCAN_STATS,
        readme: README,
    }
}

pub fn build(deps: &CheckDeps) -> Box<dyn Checker> {
    Box::new(SequentialScansCheck::new(Arc::clone(&deps.gateway)))
}

pub struct SequentialScansCheck<Q: ?Sized> {
    queries: Arc<Q>,
}

impl<Q: ScanQueries + ?Sized> SequentialScansCheck<Q> {
    pub fn new(queries: Arc<Q>) -> Self {
        Self { queries }
    }

    async fn evaluate(&self) -> CheckResult<Report> {
        let stats = self.queries.table_scan_stats().await?;
        let total = stats.len();

        let subjects: Vec<ScanSubject> = stats
            .into_iter()
            .filter(|t| t.live_rows >= MIN_LIVE_ROWS_FOR_SCAN_CHECK)
            .map(|t| ScanSubject {
                name: t.qualified_name(),
                seq_scans: t.seq_scans,
                idx_scans: t.idx_scans,
            })
            .collect();
        let considered = subjects.len();

        let finding = scan_ratio_finding(FINDING_ID, "Sequential scan ratio", subjects)
            .with_debug(format!(
                "{} of {} tables have at least {} live rows",
                considered, total, MIN_LIVE_ROWS_FOR_SCAN_CHECK
            ));

        let mut report = Report::new(metadata());
        report.add_finding(finding);
        Ok(report)
    }
}

impl<Q: ScanQueries + ?Sized> Checker for SequentialScansCheck<Q> {
    fn metadata(&self) -> CheckMetadata {
        metadata()
    }

    fn check(&self) -> CheckFuture<'_> {
        Box::pin(self.evaluate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Severity;
    use crate::gateway::{Snapshot, StaticGateway, TableScanStats};

    fn table(name: &str, seq: i64, idx: i64, live_rows: i64) -> TableScanStats {
        TableScanStats {
            schema: "public".to_string(),
            table: name.to_string(),
            seq_scans: seq,
            idx_scans: idx,
            live_rows,
        }
    }

    async fn run(tables: Vec<TableScanStats>) -> Report {
        let gateway = StaticGateway::new(Snapshot {
            table_scan_stats: tables,
            ..Default::default()
        });
        SequentialScansCheck::new(Arc::new(gateway))
            .check()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_small_tables_are_ignored() {
        let report = run(vec![table("lookup", 90_000, 0, 50)]).await;
        assert_eq!(report.severity(), Severity::Ok);
        let finding = report.finding(FINDING_ID).unwrap();
        assert!(finding.table.is_none());
        assert_eq!(
            finding.debug.as_deref(),
            Some("0 of 1 tables have at least 10000 live rows")
        );
    }

    #[tokio::test]
    async fn test_large_table_ratio_tiers() {
        let report = run(vec![
            table("events", 5_000, 100, 1_000_000),
            table("users", 5_000, 4_000, 1_000_000),
        ])
        .await;

        assert_eq!(report.severity(), Severity::Warn);
        let rows = &report.finding(FINDING_ID).unwrap().table.as_ref().unwrap().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells[0], "public.events");
        assert_eq!(rows[0].cells[3], "50.0");
    }

    #[tokio::test]
    async fn test_no_tables() {
        let report = run(Vec::new()).await;
        assert_eq!(report.severity(), Severity::Ok);
        assert_eq!(report.findings().len(), 1);
    }
}
