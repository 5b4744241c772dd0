//! shared_buffers sizing against instance memory

use std::sync::Arc;

use crate::check::{CheckFuture, CheckMetadata, CheckResult, Checker, Finding, Report, Severity};
use crate::gateway::{sql, SettingsQueries};
use crate::instance::InstanceMetadata;
use crate::registry::CheckDeps;

use super::format_bytes;

pub const CHECK_ID: &str = "shared-buffers";
pub const FINDING_ID: &str = "shared-buffers-ratio";

/// Below this share of memory the buffer cache is undersized
pub const MIN_RATIO: f64 = 0.10;
/// Above this share little memory is left for work_mem and the OS cache
pub const MAX_RATIO: f64 = 0.50;
/// At this share the host risks running out of memory
pub const FAIL_RATIO: f64 = 0.80;

const README: &str = "\
shared_buffers is PostgreSQL's own page cache. The usual starting point is
about 25% of instance memory. Below 10% the cache is undersized; above 50%
little is left for sorts, hashes and the operating system cache; at 80% or
more the host risks running out of memory.

Needs instance metadata with memory_bytes. Without it the value is only
reported.";

pub fn metadata() -> CheckMetadata {
    CheckMetadata {
        check_id: CHECK_ID,
        name: "shared_buffers sizing",
        category: "configs",
        description: "Compares shared_buffers with the instance memory",
        sql: sql::SHARED_BUFFERS_BYTES,
        readme: README,
    }
}

pub fn build(deps: &CheckDeps) -> Box<dyn Checker> {
    Box::new(SharedBuffersCheck::new(
        Arc::clone(&deps.gateway),
        deps.instance.clone(),
    ))
}

pub struct SharedBuffersCheck<Q: ?Sized> {
    queries: Arc<Q>,
    instance: Option<Arc<InstanceMetadata>>,
}

impl<Q: SettingsQueries + ?Sized> SharedBuffersCheck<Q> {
    pub fn new(queries: Arc<Q>, instance: Option<Arc<InstanceMetadata>>) -> Self {
        Self { queries, instance }
    }

    async fn evaluate(&self) -> CheckResult<Report> {
        let bytes = self.queries.shared_buffers_bytes().await?.max(0) as u64;
        let memory = self.instance.as_ref().and_then(|i| i.memory_bytes);

        let mut report = Report::new(metadata());
        report.add_finding(classify(bytes, memory));
        Ok(report)
    }
}

impl<Q: SettingsQueries + ?Sized> Checker for SharedBuffersCheck<Q> {
    fn metadata(&self) -> CheckMetadata {
        metadata()
    }

    fn check(&self) -> CheckFuture<'_> {
        Box::pin(self.evaluate())
    }
}

fn classify(shared_buffers: u64, memory: Option<u64>) -> Finding {
    let name = "shared_buffers to memory ratio";
    let memory = match memory {
        Some(m) if m > 0 => m,
        _ => {
            return Finding::new(
                FINDING_ID,
                name,
                Severity::Ok,
                format!(
                    "shared_buffers is {}; instance memory unknown, ratio not evaluated.",
                    format_bytes(shared_buffers)
                ),
            );
        }
    };

    let ratio = shared_buffers as f64 / memory as f64;
    let (severity, advice) = if ratio >= FAIL_RATIO {
        (Severity::Fail, " The host risks running out of memory.")
    } else if ratio > MAX_RATIO {
        (Severity::Warn, " Little memory is left for queries and the OS cache.")
    } else if ratio < MIN_RATIO {
        (Severity::Warn, " The buffer cache is undersized.")
    } else {
        (Severity::Ok, "")
    };

    Finding::new(
        FINDING_ID,
        name,
        severity,
        format!(
            "shared_buffers is {} of {} instance memory ({:.0}%).{}",
            format_bytes(shared_buffers),
            format_bytes(memory),
            ratio * 100.0,
            advice
        ),
    )
}
