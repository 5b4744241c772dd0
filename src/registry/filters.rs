//! Filter token validation
//!
//! A filter token is a check id, a category, or `check-id/anything`. Only
//! the part before the first `/` is significant.

use super::CheckRegistration;

/// Strip everything from the first `/` on
pub fn normalize_filter(token: &str) -> &str {
    match token.split_once('/') {
        Some((prefix, _)) => prefix,
        None => token,
    }
}

/// Split raw tokens into normalized valid filters and invalid originals.
///
/// Valid filters are de-duplicated, keeping the order of first occurrence.
/// Invalid tokens are returned exactly as given.
pub fn validate_filters<S: AsRef<str>>(
    checks: &[CheckRegistration],
    tokens: &[S],
) -> (Vec<String>, Vec<String>) {
    let known = all_filters(checks);
    let mut valid: Vec<String> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();

    for token in tokens {
        let raw = token.as_ref();
        let normalized = normalize_filter(raw);
        if known.iter().any(|k| k == normalized) {
            if !valid.iter().any(|v| v == normalized) {
                valid.push(normalized.to_string());
            }
        } else {
            invalid.push(raw.to_string());
        }
    }

    (valid, invalid)
}

/// Every accepted filter: check ids and categories, de-duplicated, in
/// registry order
pub fn all_filters(checks: &[CheckRegistration]) -> Vec<String> {
    let mut filters: Vec<String> = Vec::new();
    for registration in checks {
        let metadata = (registration.metadata)();
        for name in [metadata.check_id, metadata.category] {
            if !filters.iter().any(|f| f == name) {
                filters.push(name.to_string());
            }
        }
    }
    filters
}
