//! Static check descriptors

use serde::Serialize;

/// Immutable descriptor of a check.
///
/// Produced by a parameterless `metadata()` function per check and never
/// mutated. `check_id` values are unique kebab-case identifiers and never
/// collide with a `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckMetadata {
    pub check_id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    /// Reference SQL the check is built on
    pub sql: &'static str,
    /// Longer operator-facing documentation
    pub readme: &'static str,
}

impl CheckMetadata {
    /// Whether `token` names this check, either by id or by category
    pub fn matches(&self, token: &str) -> bool {
        self.check_id == token || self.category == token
    }
}
