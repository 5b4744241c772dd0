//! Check Orchestrator
//!
//! Runs the selected checks one at a time, in registry order. Each check
//! gets its own deadline, derived from the run context. The first error
//! or deadline aborts the whole run and no reports are returned.

mod errors;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

use crate::check::{CheckMetadata, Report, Severity};
use crate::gateway::Gateway;
use crate::instance::InstanceMetadata;
use crate::observability::{log_event_with_fields, Event, ObservationScope, Timer};
use crate::registry::{CheckDeps, CheckRegistration};

pub use errors::{RunError, RunResult};

/// Per-check deadline used when nothing else is configured
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Process exit code for a run that could not complete
pub const EXIT_ERROR: i32 = 1;

/// Run-wide parameters shared by every check
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub instance: Option<Arc<InstanceMetadata>>,
    /// Budget of each individual check
    pub check_timeout: Duration,
    /// Optional deadline for the whole run; per-check deadlines never
    /// extend past it
    pub deadline: Option<Instant>,
}

impl RunContext {
    pub fn new(check_timeout: Duration) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            instance: None,
            check_timeout,
            deadline: None,
        }
    }

    pub fn with_instance(mut self, instance: Option<Arc<InstanceMetadata>>) -> Self {
        self.instance = instance;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline for a check starting at `now`.
    ///
    /// A check timeout too large to represent as an instant means the check
    /// is bounded by the run deadline alone, if any.
    pub fn check_deadline(&self, now: Instant) -> Option<Instant> {
        match (now.checked_add(self.check_timeout), self.deadline) {
            (Some(own), Some(run_deadline)) => Some(own.min(run_deadline)),
            (own, run_deadline) => own.or(run_deadline),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_TIMEOUT)
    }
}

/// Whether a check takes part in the run.
///
/// `ignored` wins over `only`; an empty `only` selects everything.
pub fn is_selected(metadata: &CheckMetadata, only: &[String], ignored: &[String]) -> bool {
    if ignored.iter().any(|token| metadata.matches(token)) {
        return false;
    }
    only.is_empty() || only.iter().any(|token| metadata.matches(token))
}

/// Run every selected check and return their reports in registry order.
///
/// Filters must already be validated. Dropping the returned future cancels
/// the check in flight.
pub async fn run(
    ctx: &RunContext,
    gateway: Arc<dyn Gateway>,
    checks: &[CheckRegistration],
    only: &[String],
    ignored: &[String],
) -> RunResult<Vec<Report>> {
    let run_id = ctx.run_id.to_string();
    let selected: Vec<&CheckRegistration> = checks
        .iter()
        .filter(|c| is_selected(&(c.metadata)(), only, ignored))
        .collect();

    log_event_with_fields(
        Event::RunStart,
        &[
            ("run_id", run_id.as_str()),
            ("checks", selected.len().to_string().as_str()),
        ],
    );

    let deps = CheckDeps::new(gateway, ctx.instance.clone());
    let timer = Timer::new();
    let mut reports = Vec::with_capacity(selected.len());

    for registration in selected {
        match run_check(ctx, &deps, registration, &run_id).await {
            Ok(report) => reports.push(report),
            Err(err) => {
                log_event_with_fields(
                    Event::RunAborted,
                    &[
                        ("run_id", run_id.as_str()),
                        ("check_id", err.check_id()),
                        ("reason", err.to_string().as_str()),
                    ],
                );
                return Err(err);
            }
        }
    }

    log_event_with_fields(
        Event::RunComplete,
        &[
            ("run_id", run_id.as_str()),
            ("reports", reports.len().to_string().as_str()),
            ("severity", overall_severity(&reports).as_str()),
            ("duration_ms", timer.elapsed_ms().as_str()),
        ],
    );

    Ok(reports)
}

async fn run_check(
    ctx: &RunContext,
    deps: &CheckDeps,
    registration: &CheckRegistration,
    run_id: &str,
) -> RunResult<Report> {
    let metadata = (registration.metadata)();
    let checker = (registration.build)(deps);

    let scope = ObservationScope::with_fields(
        "CHECK",
        &[
            ("run_id", run_id),
            ("check_id", metadata.check_id),
            ("category", metadata.category),
        ],
    );
    let timer = Timer::new();

    let started = Instant::now();
    let deadline = ctx.check_deadline(started);

    let outcome = match deadline {
        Some(deadline) => timeout_at(deadline, checker.check()).await,
        None => Ok(checker.check().await),
    };

    match outcome {
        Ok(Ok(report)) => {
            scope.complete_with_fields(&[
                ("severity", report.severity().as_str()),
                ("duration_ms", timer.elapsed_ms().as_str()),
            ]);
            Ok(report)
        }
        Ok(Err(source)) => {
            scope.fail(&source.to_string());
            Err(RunError::Check {
                category: metadata.category.to_string(),
                check_id: metadata.check_id.to_string(),
                source,
            })
        }
        Err(_elapsed) => {
            scope.fail("deadline exceeded");
            Err(RunError::Timeout {
                category: metadata.category.to_string(),
                check_id: metadata.check_id.to_string(),
                timeout: deadline
                    .map(|d| d.saturating_duration_since(started))
                    .unwrap_or(ctx.check_timeout),
            })
        }
    }
}

/// Worst severity across reports, OK when there are none
pub fn overall_severity(reports: &[Report]) -> Severity {
    reports
        .iter()
        .map(Report::severity)
        .max()
        .unwrap_or_default()
}

/// Summary of a completed run, mapped to a process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No report is FAIL
    Healthy,
    /// At least one report is FAIL
    Failing,
}

impl RunOutcome {
    pub fn from_reports(reports: &[Report]) -> Self {
        match overall_severity(reports) {
            Severity::Fail => RunOutcome::Failing,
            Severity::Ok | Severity::Warn => RunOutcome::Healthy,
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Healthy => 0,
            RunOutcome::Failing => 2,
        }
    }
}
