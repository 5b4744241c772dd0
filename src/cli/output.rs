//! Report rendering
//!
//! Text output is meant for terminals; JSON output is one document per
//! run, suitable for dashboards and diffing.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::check::{CheckMetadata, Finding, Report, Severity, Table};
use crate::registry::{all_filters, CheckRegistration};
use crate::runner::overall_severity;

/// Output format of `run` and `list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// JSON document written by `pgcheckup run --format json`
#[derive(Debug, Serialize)]
pub struct RunDocument<'a> {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub severity: Severity,
    /// Filters that matched no check and were ignored
    pub ignored_filters: &'a [String],
    pub reports: &'a [Report],
}

impl<'a> RunDocument<'a> {
    pub fn new(run_id: Uuid, reports: &'a [Report], ignored_filters: &'a [String]) -> Self {
        Self {
            run_id,
            generated_at: Utc::now(),
            severity: overall_severity(reports),
            ignored_filters,
            reports,
        }
    }
}

/// One line of `pgcheckup list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterEntry {
    pub filter: String,
    /// "check" or "category"
    pub kind: &'static str,
    /// Check name, or the ids of the checks in the category
    pub name: String,
}

/// Every accepted filter with what it selects, in registry order
pub fn filter_entries(checks: &[CheckRegistration]) -> Vec<FilterEntry> {
    let metadata: Vec<CheckMetadata> = checks.iter().map(|c| (c.metadata)()).collect();

    all_filters(checks)
        .into_iter()
        .map(|filter| {
            if let Some(m) = metadata.iter().find(|m| m.check_id == filter) {
                FilterEntry {
                    name: m.name.to_string(),
                    filter,
                    kind: "check",
                }
            } else {
                let ids: Vec<&str> = metadata
                    .iter()
                    .filter(|m| m.category == filter)
                    .map(|m| m.check_id)
                    .collect();
                FilterEntry {
                    name: ids.join(", "),
                    filter,
                    kind: "category",
                }
            }
        })
        .collect()
}

/// Text rendering of `pgcheckup list`
pub fn render_filter_list(entries: &[FilterEntry]) -> String {
    let width = entries.iter().map(|e| e.filter.len()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{:<8}  {:<width$}  {}\n",
            entry.kind,
            entry.filter,
            entry.name,
            width = width
        ));
    }
    out
}

/// Text rendering of `pgcheckup explain`
pub fn render_explain(metadata: &CheckMetadata) -> String {
    format!(
        "{} ({})\n{}\n\n{}\n\n{}\n\nSQL:\n{}\n",
        metadata.check_id,
        metadata.category,
        metadata.name,
        metadata.description,
        metadata.readme.trim(),
        metadata.sql.trim()
    )
}

/// Text rendering of a whole run
pub fn render_text(reports: &[Report]) -> String {
    let mut out = String::new();

    for report in reports {
        let metadata = report.metadata();
        out.push_str(&format!(
            "{} {} ({}): {}\n",
            marker(report.severity()),
            metadata.check_id,
            metadata.category,
            metadata.name
        ));
        for finding in report.findings() {
            render_finding(&mut out, finding);
        }
        out.push('\n');
    }

    out.push_str(&summary_line(reports));
    out.push('\n');
    out
}

fn marker(severity: Severity) -> String {
    format!("{:<6}", format!("[{}]", severity))
}

fn render_finding(out: &mut String, finding: &Finding) {
    out.push_str(&format!(
        "  {} {}: {}\n",
        marker(finding.severity),
        finding.id,
        finding.name
    ));
    out.push_str(&format!("         {}\n", finding.details));
    if let Some(table) = &finding.table {
        render_table(out, table);
    }
}

fn render_table(out: &mut String, table: &Table) {
    if table.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.cells.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<w$}", c, w = widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    out.push_str(&format!("         {:<4}   {}\n", "", line(&table.headers)));
    for row in &table.rows {
        out.push_str(&format!(
            "         {:<4} | {}\n",
            row.severity.as_str(),
            line(&row.cells)
        ));
    }
}

/// "N checks: a OK, b WARN, c FAIL"
pub fn summary_line(reports: &[Report]) -> String {
    let count = |severity: Severity| reports.iter().filter(|r| r.severity() == severity).count();
    format!(
        "{} checks: {} OK, {} WARN, {} FAIL",
        reports.len(),
        count(Severity::Ok),
        count(Severity::Warn),
        count(Severity::Fail)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::pg_version;
    use crate::registry::ALL_CHECKS;

    fn sample_reports() -> Vec<Report> {
        let mut ok = Report::new(pg_version::metadata());
        ok.add_finding(Finding::new("major-version", "Major version", Severity::Ok, "16.2"));

        let mut table = Table::new(&["table", "ratio"]);
        table.push_row(vec!["public.events".to_string(), "50.0".to_string()], Severity::Warn);
        let mut warn = Report::new(crate::checks::sequential_scans::metadata());
        warn.add_finding(
            Finding::new("seq-scan-ratio", "Sequential scan ratio", Severity::Warn, "1 table")
                .with_table(table),
        );

        vec![ok, warn]
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample_reports());

        assert!(text.contains("[OK]   pg-version (configs): PostgreSQL version"));
        assert!(text.contains("[WARN] sequential-scans (performance)"));
        assert!(text.contains("public.events"));
        assert!(text.ends_with("2 checks: 1 OK, 1 WARN, 0 FAIL\n"));
    }

    #[test]
    fn test_run_document_json() {
        let reports = sample_reports();
        let ignored = vec!["nope".to_string()];
        let document = RunDocument::new(Uuid::new_v4(), &reports, &ignored);

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["severity"], "warn");
        assert_eq!(value["ignored_filters"][0], "nope");
        assert_eq!(value["reports"][0]["check_id"], "pg-version");
        assert_eq!(value["reports"][1]["findings"][0]["table"]["rows"][0]["severity"], "warn");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_filter_entries() {
        let entries = filter_entries(ALL_CHECKS);

        let configs = entries.iter().find(|e| e.filter == "configs").unwrap();
        assert_eq!(configs.kind, "category");
        assert_eq!(configs.name, "pg-version, shared-buffers");

        let version = entries.iter().find(|e| e.filter == "pg-version").unwrap();
        assert_eq!(version.kind, "check");
        assert_eq!(version.name, "PostgreSQL version");

        let text = render_filter_list(&entries);
        assert_eq!(text.lines().count(), entries.len());
    }

    #[test]
    fn test_render_explain() {
        let text = render_explain(&pg_version::metadata());
        assert!(text.starts_with("pg-version (configs)\n"));
        assert!(text.contains("SQL:\n"));
    }

    #[test]
    fn test_summary_line_empty() {
        assert_eq!(summary_line(&[]), "0 checks: 0 OK, 0 WARN, 0 FAIL");
    }
}
