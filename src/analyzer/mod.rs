//! Query-text analyzer
//!
//! Lexical heuristics over captured query text and scan counters:
//!
//! - [`sql_text`]: normalization, table reference detection, WHERE clause
//!   extraction and partition-key usage tests
//! - [`scan_ratio`]: sequential-to-index scan ratio tiering
//! - [`partition_usage`]: per-table tallies of queries that cannot prune
//!   partitions
//!
//! This is not a SQL parser. It has no tokenizer and does not understand
//! quoting, comments, CTEs or subqueries. Every ambiguity resolves toward
//! not flagging a query, so it under-reports rather than over-reports.

pub mod partition_usage;
pub mod scan_ratio;
pub mod sql_text;
pub mod thresholds;

pub use partition_usage::{analyze_key_usage, KeyUsageFindings};
pub use scan_ratio::{classify_scan_ratio, scan_ratio_finding, ScanRatio, ScanSubject};
pub use sql_text::{extract_where_clause, normalize_query, references_table, KeyMatcher};
