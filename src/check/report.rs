//! Report and finding model
//!
//! A [`Report`] is one check's complete output. Its severity is maintained
//! by [`Report::add_finding`], the only mutation path, and always equals the
//! worst severity among its findings.

use serde::Serialize;

use super::metadata::CheckMetadata;
use super::severity::Severity;

/// One check's full output
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(flatten)]
    metadata: CheckMetadata,
    severity: Severity,
    findings: Vec<Finding>,
}

impl Report {
    /// Create an empty report (severity OK)
    pub fn new(metadata: CheckMetadata) -> Self {
        Self {
            metadata,
            severity: Severity::Ok,
            findings: Vec::new(),
        }
    }

    /// Append a finding and raise the report severity if needed
    pub fn add_finding(&mut self, finding: Finding) {
        self.severity = self.severity.worst(finding.severity);
        self.findings.push(finding);
    }

    pub fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Look up a finding by its id
    pub fn finding(&self, id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.id == id)
    }
}

/// One atomic observation within a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Unique within its report
    pub id: String,
    pub name: String,
    pub severity: Severity,
    /// Human-readable explanation
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl Finding {
    /// Create a finding without tabular data
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        severity: Severity,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            severity,
            details: details.into(),
            table: None,
            debug: None,
        }
    }

    /// Attach tabular data
    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// Attach a debug payload
    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug = Some(debug.into());
        self
    }
}

/// Tabular data attached to a finding
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create an empty table with the given headers
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row
    pub fn push_row(&mut self, cells: Vec<String>, severity: Severity) {
        self.rows.push(TableRow { cells, severity });
    }

    /// Worst severity across all rows (OK when empty)
    pub fn severity(&self) -> Severity {
        self.rows
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One table row with its own severity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> CheckMetadata {
        CheckMetadata {
            check_id: "sample-check",
            name: "Sample",
            category: "samples",
            description: "A sample check",
            sql: "SELECT 1",
            readme: "",
        }
    }

    fn finding(id: &str, severity: Severity) -> Finding {
        Finding::new(id, id, severity, "details")
    }

    #[test]
    fn test_empty_report_is_ok() {
        let report = Report::new(metadata());
        assert_eq!(report.severity(), Severity::Ok);
        assert!(report.findings().is_empty());
    }

    #[test]
    fn test_severity_is_max_of_findings() {
        let sequences = [
            vec![Severity::Ok],
            vec![Severity::Warn, Severity::Ok],
            vec![Severity::Ok, Severity::Fail, Severity::Warn],
            vec![Severity::Warn, Severity::Warn],
        ];

        for seq in sequences {
            let mut report = Report::new(metadata());
            for (i, s) in seq.iter().enumerate() {
                report.add_finding(finding(&format!("f{}", i), *s));
            }
            assert_eq!(report.severity(), *seq.iter().max().unwrap());
            assert_eq!(report.findings().len(), seq.len());
        }
    }

    #[test]
    fn test_findings_keep_insertion_order() {
        let mut report = Report::new(metadata());
        report.add_finding(finding("b", Severity::Ok));
        report.add_finding(finding("a", Severity::Warn));

        let ids: Vec<_> = report.findings().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(report.finding("a").unwrap().severity, Severity::Warn);
        assert!(report.finding("missing").is_none());
    }

    #[test]
    fn test_table_severity() {
        let mut table = Table::new(&["table", "ratio"]);
        assert_eq!(table.severity(), Severity::Ok);

        table.push_row(vec!["t1".into(), "12".into()], Severity::Warn);
        table.push_row(vec!["t2".into(), "500".into()], Severity::Fail);
        assert_eq!(table.severity(), Severity::Fail);
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = Report::new(metadata());
        report.add_finding(finding("f1", Severity::Warn).with_debug("raw"));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["check_id"], "sample-check");
        assert_eq!(value["category"], "samples");
        assert_eq!(value["severity"], "warn");
        assert_eq!(value["findings"][0]["debug"], "raw");
        assert!(value["findings"][0].get("table").is_none());
    }
}
