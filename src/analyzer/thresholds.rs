//! Analyzer floors and tier boundaries

/// Sequential scans below this are too few to judge
pub const MIN_SEQ_SCANS: i64 = 1_000;

/// seq/idx ratio at which a table is flagged WARN
pub const WARN_SCAN_RATIO: f64 = 10.0;

/// seq/idx ratio at which a table is flagged FAIL
pub const FAIL_SCAN_RATIO: f64 = 100.0;

/// A query missing the partition key is only a problem from this many calls...
pub const MIN_PROBLEM_CALLS: i64 = 100;

/// ...or this much cumulative execution time (1 minute)
pub const MIN_PROBLEM_EXEC_MS: f64 = 60_000.0;

/// Summed calls per table that escalate WARN to FAIL
pub const FAIL_PROBLEM_CALLS: i64 = 1_000;

/// Summed execution time per table that escalates WARN to FAIL (1 hour)
pub const FAIL_PROBLEM_EXEC_MS: f64 = 3_600_000.0;

/// Ordinary tables smaller than this are cheap to scan sequentially
pub const MIN_LIVE_ROWS_FOR_SCAN_CHECK: i64 = 10_000;

/// Captured query text shown in finding rows is cut to this many characters
pub const MAX_QUERY_PREVIEW_CHARS: usize = 120;
