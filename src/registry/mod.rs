//! Check Registry
//!
//! The static, order-preserving list of every check this binary knows.
//! Both the runner and the filter validator read it; nothing is discovered
//! at runtime. Lookups are linear scans since the list is short.

mod filters;

use std::sync::Arc;

use crate::check::{CheckMetadata, Checker};
use crate::checks;
use crate::gateway::Gateway;
use crate::instance::InstanceMetadata;

pub use filters::{all_filters, normalize_filter, validate_filters};

/// Everything a check constructor may depend on
#[derive(Clone)]
pub struct CheckDeps {
    pub gateway: Arc<dyn Gateway>,
    /// Facts about the host, when the caller provided them
    pub instance: Option<Arc<InstanceMetadata>>,
}

impl CheckDeps {
    pub fn new(gateway: Arc<dyn Gateway>, instance: Option<Arc<InstanceMetadata>>) -> Self {
        Self { gateway, instance }
    }
}

/// A (metadata, constructor) pair
#[derive(Clone, Copy)]
pub struct CheckRegistration {
    pub metadata: fn() -> CheckMetadata,
    pub build: fn(&CheckDeps) -> Box<dyn Checker>,
}

impl CheckRegistration {
    pub const fn new(
        metadata: fn() -> CheckMetadata,
        build: fn(&CheckDeps) -> Box<dyn Checker>,
    ) -> Self {
        Self { metadata, build }
    }
}

/// Every registered check, in execution order
pub static ALL_CHECKS: &[CheckRegistration] = &[
    CheckRegistration::new(checks::pg_version::metadata, checks::pg_version::build),
    CheckRegistration::new(
        checks::shared_buffers::metadata,
        checks::shared_buffers::build,
    ),
    CheckRegistration::new(
        checks::connection_headroom::metadata,
        checks::connection_headroom::build,
    ),
    CheckRegistration::new(
        checks::partition_usage::metadata,
        checks::partition_usage::build,
    ),
    CheckRegistration::new(
        checks::sequential_scans::metadata,
        checks::sequential_scans::build,
    ),
];

/// Find a registration by check id
pub fn find_check<'a>(
    checks: &'a [CheckRegistration],
    check_id: &str,
) -> Option<&'a CheckRegistration> {
    checks.iter().find(|c| (c.metadata)().check_id == check_id)
}

/// Registrations whose category equals `category`, in registry order
pub fn checks_in_category<'a>(
    checks: &'a [CheckRegistration],
    category: &str,
) -> Vec<&'a CheckRegistration> {
    checks
        .iter()
        .filter(|c| (c.metadata)().category == category)
        .collect()
}
