//! Partition-key usage analysis
//!
//! For every partitioned table with a column key, captured queries that
//! reference the table but never constrain the key are tallied per table.
//! Such queries cannot prune partitions and visit all of them.
//!
//! Two independent findings come out of one pass:
//! - every referencing query; plain queries are judged on their WHERE
//!   clause, JOIN queries on everything after the first FROM so that keys
//!   referenced only in ON clauses still count
//! - JOIN queries only, judged the same way as in the first finding

use std::collections::BTreeMap;

use crate::check::{Finding, Severity, Table};
use crate::gateway::{PartitionedTable, QueryStatistic};

use super::sql_text::{
    extract_where_clause, is_join_query, is_row_access_statement, normalize_query,
    references_table, text_after_from, KeyMatcher,
};
use super::thresholds::{
    FAIL_PROBLEM_CALLS, FAIL_PROBLEM_EXEC_MS, MAX_QUERY_PREVIEW_CHARS, MIN_PROBLEM_CALLS,
    MIN_PROBLEM_EXEC_MS,
};

pub const FILTER_FINDING_ID: &str = "partition-key-filter";
pub const JOIN_FINDING_ID: &str = "partition-key-join";

/// The two findings produced by [`analyze_key_usage`]
#[derive(Debug, Clone, PartialEq)]
pub struct KeyUsageFindings {
    pub filter: Finding,
    pub join: Finding,
}

struct Candidate<'a> {
    table: &'a PartitionedTable,
    matcher: KeyMatcher,
}

/// Summed volume of one table's problem queries
#[derive(Debug, Clone, Default)]
struct ProblemTally {
    queries: usize,
    calls: i64,
    exec_ms: f64,
    top_query: String,
    top_exec_ms: f64,
}

impl ProblemTally {
    fn add(&mut self, stat: &QueryStatistic) {
        self.queries += 1;
        self.calls += stat.calls;
        self.exec_ms += stat.total_exec_time_ms;
        if self.top_query.is_empty() || stat.total_exec_time_ms > self.top_exec_ms {
            self.top_query = stat.query.clone();
            self.top_exec_ms = stat.total_exec_time_ms;
        }
    }

    fn severity(&self) -> Severity {
        if self.calls >= FAIL_PROBLEM_CALLS || self.exec_ms >= FAIL_PROBLEM_EXEC_MS {
            Severity::Fail
        } else {
            Severity::Warn
        }
    }
}

/// Whether a statement is executed often enough, or long enough, to matter
pub fn meets_problem_volume(stat: &QueryStatistic) -> bool {
    stat.calls >= MIN_PROBLEM_CALLS || stat.total_exec_time_ms >= MIN_PROBLEM_EXEC_MS
}

/// Run the partition-key usage analysis over all captured statements
pub fn analyze_key_usage(
    tables: &[PartitionedTable],
    stats: &[QueryStatistic],
) -> Result<KeyUsageFindings, regex::Error> {
    let candidates = tables
        .iter()
        .filter(|t| !t.key_is_expression && !t.partition_key.is_empty())
        .map(|table| {
            Ok(Candidate {
                table,
                matcher: KeyMatcher::new(&table.partition_key)?,
            })
        })
        .collect::<Result<Vec<_>, regex::Error>>()?;

    let expression_keyed: Vec<String> = tables
        .iter()
        .filter(|t| t.key_is_expression || t.partition_key.is_empty())
        .map(PartitionedTable::qualified_name)
        .collect();

    let mut filter_tallies: BTreeMap<usize, ProblemTally> = BTreeMap::new();
    let mut join_tallies: BTreeMap<usize, ProblemTally> = BTreeMap::new();

    for stat in stats.iter().filter(|s| meets_problem_volume(s)) {
        let normalized = normalize_query(&stat.query);
        if !is_row_access_statement(&normalized) {
            continue;
        }

        let join = is_join_query(&normalized);
        let searched = if join {
            text_after_from(&normalized)
        } else {
            extract_where_clause(&normalized)
        };

        for (i, candidate) in candidates.iter().enumerate() {
            let table = candidate.table;
            if !references_table(&normalized, &table.schema, &table.table) {
                continue;
            }

            let uses_key = if join {
                candidate.matcher.is_mentioned_in(searched)
            } else {
                candidate.matcher.is_used_in(searched)
            };
            if uses_key {
                continue;
            }

            filter_tallies.entry(i).or_default().add(stat);
            if join {
                join_tallies.entry(i).or_default().add(stat);
            }
        }
    }

    let filter = build_finding(
        FILTER_FINDING_ID,
        "Queries without partition key filter",
        "queried without using their partition key; \
         these queries cannot prune partitions and scan all of them.",
        &candidates,
        &filter_tallies,
        &expression_keyed,
    );
    let join = build_finding(
        JOIN_FINDING_ID,
        "JOINs without partition key",
        "joined without any reference to their partition key; \
         the join has to visit every partition.",
        &candidates,
        &join_tallies,
        &expression_keyed,
    );

    Ok(KeyUsageFindings { filter, join })
}

fn build_finding(
    id: &str,
    name: &str,
    problem: &str,
    candidates: &[Candidate<'_>],
    tallies: &BTreeMap<usize, ProblemTally>,
    expression_keyed: &[String],
) -> Finding {
    let mut note = String::new();
    if !expression_keyed.is_empty() {
        note = format!(
            " Tables partitioned by an expression were not analyzed: {}.",
            expression_keyed.join(", ")
        );
    }

    if tallies.is_empty() {
        return Finding::new(
            id,
            name,
            Severity::Ok,
            format!(
                "No frequently executed query against {} partitioned table(s) misses the partition key.{}",
                candidates.len(),
                note
            ),
        );
    }

    let mut flagged: Vec<(&Candidate<'_>, &ProblemTally)> = tallies
        .iter()
        .filter_map(|(i, tally)| candidates.get(*i).map(|c| (c, tally)))
        .collect();
    flagged.sort_by(|a, b| {
        b.1.severity()
            .cmp(&a.1.severity())
            .then_with(|| b.1.exec_ms.total_cmp(&a.1.exec_ms))
    });

    let mut table = Table::new(&[
        "table",
        "partition key",
        "queries",
        "calls",
        "total time",
        "top query",
    ]);
    let mut debug = String::new();
    for (candidate, tally) in &flagged {
        let name = candidate.table.qualified_name();
        table.push_row(
            vec![
                name.clone(),
                candidate.matcher.columns().join(", "),
                tally.queries.to_string(),
                tally.calls.to_string(),
                format_exec_time(tally.exec_ms),
                preview(&tally.top_query),
            ],
            tally.severity(),
        );
        debug.push_str(&format!("{}: {}\n", name, tally.top_query));
    }

    let details = format!(
        "{} partitioned table(s) are {} FAIL once a table's problem queries reach {} calls or {}.{}",
        flagged.len(),
        problem,
        FAIL_PROBLEM_CALLS,
        format_exec_time(FAIL_PROBLEM_EXEC_MS),
        note
    );

    Finding::new(id, name, table.severity(), details)
        .with_table(table)
        .with_debug(debug.trim_end())
}

/// Human-readable cumulative execution time
pub fn format_exec_time(ms: f64) -> String {
    if ms >= 3_600_000.0 {
        format!("{:.1} h", ms / 3_600_000.0)
    } else if ms >= 60_000.0 {
        format!("{:.1} min", ms / 60_000.0)
    } else if ms >= 1_000.0 {
        format!("{:.1} s", ms / 1_000.0)
    } else {
        format!("{:.0} ms", ms)
    }
}

fn preview(query: &str) -> String {
    let collapsed = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_QUERY_PREVIEW_CHARS {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(MAX_QUERY_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}
