//! Sequential-to-index scan ratio tiering
//!
//! Needs only scan counters, no query text.

use std::fmt;

use crate::check::{Finding, Severity, Table};

use super::thresholds::{FAIL_SCAN_RATIO, MIN_SEQ_SCANS, WARN_SCAN_RATIO};

/// seq/idx ratio of one table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanRatio {
    Ratio(f64),
    /// No index scans at all; the ratio is effectively infinite and is
    /// represented by the sequential scan count itself
    NoIndexScans(i64),
}

impl ScanRatio {
    pub fn compute(seq_scans: i64, idx_scans: i64) -> Self {
        if idx_scans <= 0 {
            ScanRatio::NoIndexScans(seq_scans)
        } else {
            ScanRatio::Ratio(seq_scans as f64 / idx_scans as f64)
        }
    }

    /// Value compared against the tier boundaries
    pub fn value(&self) -> f64 {
        match self {
            ScanRatio::Ratio(r) => *r,
            ScanRatio::NoIndexScans(seq) => *seq as f64,
        }
    }
}

impl fmt::Display for ScanRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanRatio::Ratio(r) => write!(f, "{:.1}", r),
            ScanRatio::NoIndexScans(_) => write!(f, "no idx scans"),
        }
    }
}

/// Classify a table's scan counters.
///
/// `None` when sequential scans are below the volume floor or the ratio is
/// below the WARN boundary.
pub fn classify_scan_ratio(seq_scans: i64, idx_scans: i64) -> Option<(ScanRatio, Severity)> {
    if seq_scans < MIN_SEQ_SCANS {
        return None;
    }

    let ratio = ScanRatio::compute(seq_scans, idx_scans);
    let value = ratio.value();
    if value >= FAIL_SCAN_RATIO {
        Some((ratio, Severity::Fail))
    } else if value >= WARN_SCAN_RATIO {
        Some((ratio, Severity::Warn))
    } else {
        None
    }
}

/// A table's identity and scan counters, as fed to [`scan_ratio_finding`]
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSubject {
    pub name: String,
    pub seq_scans: i64,
    pub idx_scans: i64,
}

/// Build one finding with a row per flagged table, worst ratio first.
///
/// The finding's severity is the worst row severity, OK when no table is
/// flagged.
pub fn scan_ratio_finding(
    id: &str,
    name: &str,
    subjects: impl IntoIterator<Item = ScanSubject>,
) -> Finding {
    let mut flagged: Vec<(ScanSubject, ScanRatio, Severity)> = subjects
        .into_iter()
        .filter_map(|s| {
            classify_scan_ratio(s.seq_scans, s.idx_scans).map(|(ratio, sev)| (s, ratio, sev))
        })
        .collect();

    if flagged.is_empty() {
        return Finding::new(
            id,
            name,
            Severity::Ok,
            format!(
                "No table with at least {} sequential scans has a seq/idx scan ratio of {} or more.",
                MIN_SEQ_SCANS, WARN_SCAN_RATIO
            ),
        );
    }

    flagged.sort_by(|a, b| {
        b.2.cmp(&a.2)
            .then_with(|| b.1.value().total_cmp(&a.1.value()))
            .then_with(|| a.0.name.cmp(&b.0.name))
    });

    let mut table = Table::new(&["table", "seq scans", "idx scans", "ratio"]);
    for (subject, ratio, severity) in &flagged {
        table.push_row(
            vec![
                subject.name.clone(),
                subject.seq_scans.to_string(),
                subject.idx_scans.to_string(),
                ratio.to_string(),
            ],
            *severity,
        );
    }

    let details = format!(
        "{} table(s) are read mostly through sequential scans (WARN at ratio {}, FAIL at {}). \
         Check for missing indexes or predicates that cannot use them.",
        flagged.len(),
        WARN_SCAN_RATIO,
        FAIL_SCAN_RATIO
    );

    Finding::new(id, name, table.severity(), details).with_table(table)
}
