//! Connection headroom
//!
//! Compares connected client backends with the slots available to
//! ordinary roles, and active backends with the host's vCPU count when the
//! instance metadata provides it.

use std::sync::Arc;

use crate::check::{CheckFuture, CheckMetadata, CheckResult, Checker, Finding, Report, Severity};
use crate::gateway::{sql, ConnectionQueries, ConnectionUsage};
use crate::instance::InstanceMetadata;
use crate::registry::CheckDeps;

pub const CHECK_ID: &str = "connection-headroom";
pub const USAGE_FINDING_ID: &str = "connection-usage";
pub const ACTIVE_FINDING_ID: &str = "active-per-vcpu";

/// Slot usage (percent) flagged WARN
pub const WARN_USAGE_PCT: f64 = 80.0;
/// Slot usage (percent) flagged FAIL
pub const FAIL_USAGE_PCT: f64 = 95.0;
/// Active backends per vCPU above which the host is oversubscribed
pub const MAX_ACTIVE_PER_VCPU: i64 = 4;

const README: &str = "\
New connections are refused once max_connections minus the reserved slots
are taken. The check warns at 80% slot usage and fails at 95%.

When instance metadata lists the vCPU count, more than 4 active backends
per vCPU is reported as CPU oversubscription: the backends compete for CPU
instead of doing work, and a connection pooler usually helps.";

pub fn metadata() -> CheckMetadata {
    CheckMetadata {
        check_id: CHECK_ID,
        name: "Connection headroom",
        category: "connections",
        description: "Checks how close the server is to refusing connections",
        sql: sql::CONNECTION_USAGE,
        readme: README,
    }
}

pub fn build(deps: &CheckDeps) -> Box<dyn Checker> {
    Box::new(ConnectionHeadroomCheck::new(
        Arc::clone(&deps.gateway),
        deps.instance.clone(),
    ))
}

pub struct ConnectionHeadroomCheck<Q: ?Sized> {
    queries: Arc<Q>,
    instance: Option<Arc<InstanceMetadata>>,
}

impl<Q: ConnectionQueries + ?Sized> ConnectionHeadroomCheck<Q> {
    pub fn new(queries: Arc<Q>, instance: Option<Arc<InstanceMetadata>>) -> Self {
        Self { queries, instance }
    }

    async fn evaluate(&self) -> CheckResult<Report> {
        let usage = self.queries.connection_usage().await?;

        let mut report = Report::new(metadata());
        report.add_finding(usage_finding(&usage));

        if let Some(vcpus) = self.instance.as_ref().and_then(|i| i.vcpus) {
            report.add_finding(active_finding(&usage, vcpus));
        }

        Ok(report)
    }
}

impl<Q: ConnectionQueries + ?Sized> Checker for ConnectionHeadroomCheck<Q> {
    fn metadata(&self) -> CheckMetadata {
        metadata()
    }

    fn check(&self) -> CheckFuture<'_> {
        Box::pin(self.evaluate())
    }
}

fn usage_finding(usage: &ConnectionUsage) -> Finding {
    let available = usage.available_slots();
    let pct = usage.total as f64 * 100.0 / available as f64;

    let severity = if pct >= FAIL_USAGE_PCT {
        Severity::Fail
    } else if pct >= WARN_USAGE_PCT {
        Severity::Warn
    } else {
        Severity::Ok
    };

    Finding::new(
        USAGE_FINDING_ID,
        "Connection slot usage",
        severity,
        format!(
            "{} of {} connection slots in use ({:.1}%). max_connections = {}, {} reserved.",
            usage.total, available, pct, usage.max_connections, usage.reserved_connections
        ),
    )
}

fn active_finding(usage: &ConnectionUsage, vcpus: u32) -> Finding {
    let limit = MAX_ACTIVE_PER_VCPU * i64::from(vcpus);
    let severity = if usage.active > limit {
        Severity::Warn
    } else {
        Severity::Ok
    };

    Finding::new(
        ACTIVE_FINDING_ID,
        "Active connections per vCPU",
        severity,
        format!(
            "{} active backends on {} vCPU(s); more than {} per vCPU oversubscribes the CPU.",
            usage.active, vcpus, MAX_ACTIVE_PER_VCPU
        ),
    )
}
