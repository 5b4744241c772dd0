//! Lexical helpers over captured query text
//!
//! All functions here expect text produced by [`normalize_query`]:
//! lowercase, with every whitespace run collapsed to a single space.

use regex::Regex;

/// Keywords that end a WHERE clause
const CLAUSE_TERMINATORS: &[&str] = &[
    "order by",
    "group by",
    "having",
    "limit",
    "offset",
    "for update",
    "for share",
    ";",
];

/// Leading keywords of statements that never read rows of a table through
/// a predicate. Such statements are not checked for partition-key usage,
/// except `insert ... select`.
const NON_ROW_ACCESS_PREFIXES: &[&str] = &[
    "insert", "copy", "create", "alter", "drop", "truncate", "vacuum", "analyze", "grant",
    "revoke", "comment", "set", "show", "begin", "commit", "rollback", "refresh", "reindex",
    "cluster", "lock", "explain",
];

/// Lowercase and collapse whitespace runs (including newlines) to one space
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// First position of `keyword` in `haystack` that is not part of a longer
/// identifier. Boundaries are only enforced on sides where the keyword
/// itself starts or ends with an identifier character.
fn find_keyword(haystack: &str, keyword: &str) -> Option<usize> {
    let check_left = keyword.chars().next().is_some_and(is_ident_char);
    let check_right = keyword.chars().last().is_some_and(is_ident_char);

    haystack.match_indices(keyword).map(|(i, _)| i).find(|&i| {
        let left_ok = !check_left || !haystack[..i].chars().last().is_some_and(is_ident_char);
        let right_ok = !check_right
            || !haystack[i + keyword.len()..]
                .chars()
                .next()
                .is_some_and(is_ident_char);
        left_ok && right_ok
    })
}

/// Whether the query mentions the table: schema-qualified, bare, or quoted
pub fn references_table(normalized: &str, schema: &str, table: &str) -> bool {
    let table = table.to_lowercase();
    let qualified = format!("{}.{}", schema.to_lowercase(), table);
    let quoted = format!("\"{}\"", table);

    normalized.contains(&qualified) || normalized.contains(&table) || normalized.contains(&quoted)
}

/// The text between the first ` where ` and the first clause terminator.
///
/// Empty when the query has no WHERE clause.
pub fn extract_where_clause(normalized: &str) -> &str {
    let Some(pos) = normalized.find(" where ") else {
        return "";
    };
    let remainder = &normalized[pos + " where ".len()..];

    let end = CLAUSE_TERMINATORS
        .iter()
        .filter_map(|kw| find_keyword(remainder, kw))
        .min()
        .unwrap_or(remainder.len());

    remainder[..end].trim()
}

/// Whether the statement contains a JOIN
pub fn is_join_query(normalized: &str) -> bool {
    find_keyword(normalized, "join").is_some()
}

/// Everything after the first ` from `, or empty when there is none
pub fn text_after_from(normalized: &str) -> &str {
    match normalized.find(" from ") {
        Some(pos) => &normalized[pos + " from ".len()..],
        None => "",
    }
}

/// Whether the statement can read rows through a predicate at all
pub fn is_row_access_statement(normalized: &str) -> bool {
    let first_word = normalized
        .trim_start_matches(|c: char| c == '(' || c.is_whitespace())
        .split(|c: char| !is_ident_char(c))
        .next()
        .unwrap_or("");
    if first_word == "insert" {
        return find_keyword(normalized, "select").is_some();
    }
    !NON_ROW_ACCESS_PREFIXES.contains(&first_word)
}

/// Tests query text for references to a table's partition-key columns
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    columns: Vec<String>,
    patterns: Vec<Regex>,
}

impl KeyMatcher {
    /// Build matchers for the given key columns
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Result<Self, regex::Error> {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_lowercase()).collect();
        let patterns = columns
            .iter()
            .map(|column| Regex::new(&key_usage_pattern(column)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns, patterns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether any key column is compared in `where_clause`.
    ///
    /// A column counts when it is followed by `=`, `<`, `>`, `in`,
    /// `between`, `is` or `any` (optionally after a `::type` cast), or when
    /// it is table-qualified (`alias.column`).
    pub fn is_used_in(&self, where_clause: &str) -> bool {
        !where_clause.is_empty() && self.patterns.iter().any(|p| p.is_match(where_clause))
    }

    /// Whether any key column name appears anywhere in `text`.
    ///
    /// Deliberately loose: used for JOIN queries, where the key may only
    /// appear in an ON clause.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        self.columns.iter().any(|c| text.contains(c.as_str()))
    }
}

fn key_usage_pattern(column: &str) -> String {
    let col = regex::escape(column);
    format!(
        r#"(?:^|[^a-z0-9_])"?{col}"?(?:::\s*[a-z0-9_]+)?\s*(?:=|<|>|(?:in|between|is|any)\b)|\."?{col}"?(?:[^a-z0-9_]|$)"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(columns: &[&str]) -> KeyMatcher {
        KeyMatcher::new(columns).unwrap()
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(
            normalize_query("SELECT *\n  FROM  Orders\tWHERE id = 1"),
            "select * from orders where id = 1"
        );
    }

    #[test]
    fn test_extract_where_clause_strips_trailing_clause() {
        assert_eq!(
            extract_where_clause("select * from t where a=1 order by b"),
            "a=1"
        );
    }

    #[test]
    fn test_extract_where_clause_without_where() {
        assert_eq!(extract_where_clause("select * from t"), "");
    }

    #[test]
    fn test_extract_where_clause_terminators() {
        let cases = [
            ("select * from t where a = 1 group by b", "a = 1"),
            ("select * from t where a = 1 limit 10", "a = 1"),
            ("select * from t where a = 1 offset 5", "a = 1"),
            ("select * from t where a = 1 for update", "a = 1"),
            ("select * from t where a = 1 for share", "a = 1"),
            ("select * from t where a = 1;", "a = 1"),
            ("select b from t where a = 1 group by b having count(*) > 1", "a = 1"),
        ];
        for (query, expected) in cases {
            assert_eq!(extract_where_clause(query), expected, "query: {}", query);
        }
    }

    #[test]
    fn test_extract_where_clause_earliest_terminator_wins() {
        assert_eq!(
            extract_where_clause("select * from t where a = 1 limit 5 order by b"),
            "a = 1"
        );
    }

    #[test]
    fn test_terminator_inside_identifier_is_ignored() {
        assert_eq!(
            extract_where_clause("select * from t where credit_limit > 5 and created_at > $1"),
            "credit_limit > 5 and created_at > $1"
        );
    }

    #[test]
    fn test_references_table() {
        assert!(references_table("select * from public.orders", "public", "orders"));
        assert!(references_table("select * from orders", "public", "orders"));
        assert!(references_table("select * from \"orders\"", "public", "orders"));
        assert!(references_table("select * from orders", "public", "Orders"));
        assert!(!references_table("select * from customers", "public", "orders"));
    }

    #[test]
    fn test_key_used_with_comparison() {
        let m = matcher(&["created_at"]);
        let clause = extract_where_clause("select * from orders where created_at > $1");
        assert!(m.is_used_in(clause));
    }

    #[test]
    fn test_key_not_used() {
        let m = matcher(&["created_at"]);
        let clause = extract_where_clause("select * from orders where customer_id = $1");
        assert!(!m.is_used_in(clause));
    }

    #[test]
    fn test_key_operators() {
        let m = matcher(&["region"]);
        for clause in [
            "region = $1",
            "region=$1",
            "region < 'm'",
            "region > 'm'",
            "region in ($1, $2)",
            "region between 'a' and 'm'",
            "region is not null",
            "region = any($1)",
            "o.region <> $1",
            "\"region\" = $1",
            "region::text = $1",
        ] {
            assert!(m.is_used_in(clause), "clause: {}", clause);
        }
    }

    #[test]
    fn test_key_requires_operator_or_qualifier() {
        let m = matcher(&["region"]);
        for clause in [
            "subregion = $1",
            "region_id = $1",
            "lower(region) like $1",
            "regional = true",
            "region_code inside",
        ] {
            assert!(!m.is_used_in(clause), "clause: {}", clause);
        }
    }

    #[test]
    fn test_any_key_column_counts() {
        let m = matcher(&["tenant_id", "created_at"]);
        assert!(m.is_used_in("created_at >= $1"));
        assert!(m.is_used_in("tenant_id = $1"));
        assert!(!m.is_used_in("status = $1"));
    }

    #[test]
    fn test_empty_clause_never_uses_key() {
        let m = matcher(&["created_at"]);
        assert!(!m.is_used_in(""));
    }

    #[test]
    fn test_join_detection_and_after_from() {
        let q = "select * from orders o join customers c on c.id = o.customer_id";
        assert!(is_join_query(q));
        assert!(!is_join_query("select joined_at from orders"));
        assert_eq!(
            text_after_from(q),
            "orders o join customers c on c.id = o.customer_id"
        );
        assert_eq!(text_after_from("select 1"), "");
    }

    #[test]
    fn test_loose_mention_for_joins() {
        let m = matcher(&["created_at"]);
        let q = "select * from orders o join items i on i.order_id = o.id and i.created_at = o.created_at";
        assert!(m.is_mentioned_in(text_after_from(q)));
        assert!(!m.is_mentioned_in(text_after_from(
            "select * from orders o join items i on i.order_id = o.id"
        )));
    }

    #[test]
    fn test_row_access_statements() {
        assert!(is_row_access_statement("select * from orders"));
        assert!(is_row_access_statement("(select 1) union (select 2)"));
        assert!(is_row_access_statement("update orders set x = 1"));
        assert!(is_row_access_statement("delete from orders where id = 1"));
        assert!(is_row_access_statement("with recent as (select 1) select * from recent"));
        assert!(!is_row_access_statement("insert into orders values ($1)"));
        assert!(is_row_access_statement(
            "insert into orders_archive select * from orders where status = $1"
        ));
        assert!(!is_row_access_statement("insert into selections values ($1)"));
        assert!(!is_row_access_statement("copy orders from stdin"));
        assert!(!is_row_access_statement("vacuum orders"));
    }
}
