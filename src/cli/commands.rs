//! CLI command implementations
//!
//! `run` builds a tokio runtime, opens the gateway and hands the selected
//! checks to the runner. `list` and `explain` only read the registry.

use std::path::Path;
use std::sync::Arc;

use tokio::time::Instant;

use crate::check::Report;
use crate::gateway::{Gateway, PgGateway, Snapshot, StaticGateway};
use crate::instance::InstanceMetadata;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::registry::{find_check, validate_filters, CheckRegistration, ALL_CHECKS};
use crate::runner::{self, RunContext, RunOutcome};

use super::args::{Command, RunArgs};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{write_json, write_text};
use super::output::{
    filter_entries, render_explain, render_filter_list, render_text, OutputFormat, RunDocument,
};

/// Parse arguments and run the chosen command. Returns the exit code.
pub fn run() -> CliResult<i32> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<i32> {
    match cmd {
        Command::Run(args) => run_checks(&args),
        Command::List { format } => list(format).map(|_| 0),
        Command::Explain { check_id } => explain(&check_id).map(|_| 0),
    }
}

/// Filters split into valid selections and rejected tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub only: Vec<String>,
    pub ignore: Vec<String>,
    pub rejected: Vec<String>,
}

/// Validate `only` and `ignore`, logging every rejected token.
///
/// Fails when `only` was given but none of its tokens is known, since an
/// empty `only` would select every check.
pub fn select(
    checks: &[CheckRegistration],
    only: &[String],
    ignore: &[String],
) -> CliResult<Selection> {
    let (valid_only, mut rejected) = validate_filters(checks, only);
    let (ignore, rejected_ignore) = validate_filters(checks, ignore);
    rejected.extend(rejected_ignore);

    for token in &rejected {
        log_event_with_fields(Event::FilterRejected, &[("filter", token.as_str())]);
    }

    if !only.is_empty() && valid_only.is_empty() {
        return Err(CliError::config_error(format!(
            "None of the --only filters matches a check or category: {}",
            only.join(", ")
        )));
    }

    Ok(Selection {
        only: valid_only,
        ignore,
        rejected,
    })
}

fn load_instance(path: Option<&Path>) -> CliResult<Option<Arc<InstanceMetadata>>> {
    match path {
        Some(path) => {
            let metadata = InstanceMetadata::load(path)?;
            log_event_with_fields(
                Event::InstanceMetadataLoaded,
                &[("path", path.display().to_string().as_str())],
            );
            Ok(Some(Arc::new(metadata)))
        }
        None => {
            log_event(Event::InstanceMetadataAbsent);
            Ok(None)
        }
    }
}

/// `pgcheckup run`
pub fn run_checks(args: &RunArgs) -> CliResult<i32> {
    let config = Config::resolve(args)?;
    Logger::set_min_level(config.min_log_level()?);
    if let Some(path) = &args.config {
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path.display().to_string().as_str())],
        );
    }

    let instance = load_instance(config.instance_metadata.as_deref())?;
    let selection = select(ALL_CHECKS, &config.only, &config.ignore)?;
    let ctx = RunContext::new(config.check_timeout()).with_instance(instance);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let reports = rt.block_on(async {
        let gateway = open_gateway(&config, args.snapshot.as_deref()).await?;
        execute(ctx.clone(), &config, gateway, &selection).await
    })?;

    match config.format {
        OutputFormat::Text => write_text(&render_text(&reports))?,
        OutputFormat::Json => {
            write_json(&RunDocument::new(ctx.run_id, &reports, &selection.rejected))?
        }
    }

    Ok(RunOutcome::from_reports(&reports).exit_code())
}

async fn open_gateway(config: &Config, snapshot: Option<&Path>) -> CliResult<Arc<dyn Gateway>> {
    if let Some(path) = snapshot {
        let snapshot = Snapshot::load(path)?;
        return Ok(Arc::new(StaticGateway::new(snapshot)));
    }

    match &config.database_url {
        Some(url) => Ok(Arc::new(PgGateway::connect(url).await?)),
        None => Err(CliError::config_error(
            "No database given. Set database_url in the config, or pass --database-url or --snapshot.",
        )),
    }
}

/// Run the selected checks against `gateway`, applying the run deadline
pub async fn execute(
    ctx: RunContext,
    config: &Config,
    gateway: Arc<dyn Gateway>,
    selection: &Selection,
) -> CliResult<Vec<Report>> {
    let ctx = match config
        .run_timeout()
        .and_then(|timeout| Instant::now().checked_add(timeout))
    {
        Some(deadline) => ctx.with_deadline(deadline),
        None => ctx,
    };

    let reports = runner::run(
        &ctx,
        gateway,
        ALL_CHECKS,
        &selection.only,
        &selection.ignore,
    )
    .await?;

    Ok(reports)
}

/// `pgcheckup list`
pub fn list(format: OutputFormat) -> CliResult<()> {
    let entries = filter_entries(ALL_CHECKS);
    match format {
        OutputFormat::Text => write_text(&render_filter_list(&entries)),
        OutputFormat::Json => write_json(&entries),
    }
}

/// `pgcheckup explain`
pub fn explain(check_id: &str) -> CliResult<()> {
    let registration =
        find_check(ALL_CHECKS, check_id).ok_or_else(|| CliError::unknown_check(check_id))?;
    write_text(&render_explain(&(registration.metadata)()))
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use crate::check::Severity;
    use crate::gateway::{ConnectionUsage, PartitionedTable, QueryStatistic};
    use std::fs;
    use tempfile::TempDir;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn healthy_snapshot() -> Snapshot {
        Snapshot {
            connection_usage: Some(ConnectionUsage {
                max_connections: 100,
                reserved_connections: 3,
                total: 12,
                active: 2,
            }),
            server_version_num: Some(160002),
            shared_buffers_bytes: Some(128 * 1024 * 1024),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_splits_tokens() {
        let selection = select(
            ALL_CHECKS,
            &strings(&["configs", "configs/x", "bogus"]),
            &strings(&["pg-version/major-version", "nope"]),
        )
        .unwrap();

        assert_eq!(selection.only, vec!["configs"]);
        assert_eq!(selection.ignore, vec!["pg-version"]);
        assert_eq!(selection.rejected, vec!["bogus", "nope"]);
    }

    #[test]
    fn test_select_rejects_only_with_no_known_token() {
        let err = select(ALL_CHECKS, &strings(&["bogus", "configs/x"]), &[]).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert!(err.message().contains("bogus"));

        // Unknown ignore tokens alone never block the run
        let selection = select(ALL_CHECKS, &[], &strings(&["nope"])).unwrap();
        assert!(selection.only.is_empty());
        assert_eq!(selection.rejected, vec!["nope"]);
    }

    #[tokio::test]
    async fn test_execute_against_snapshot() {
        let selection = select(ALL_CHECKS, &[], &[]).unwrap();
        let gateway: Arc<dyn Gateway> = Arc::new(StaticGateway::new(healthy_snapshot()));

        let reports = execute(RunContext::default(), &Config::default(), gateway, &selection)
            .await
            .unwrap();

        assert_eq!(reports.len(), ALL_CHECKS.len());
        assert!(reports.iter().all(|r| r.severity() == Severity::Ok));
        assert_eq!(RunOutcome::from_reports(&reports).exit_code(), 0);
    }

    #[tokio::test]
    async fn test_execute_surfaces_run_error() {
        let selection = select(ALL_CHECKS, &strings(&["connections"]), &[]).unwrap();
        let gateway: Arc<dyn Gateway> = Arc::new(StaticGateway::default());

        let err = execute(RunContext::default(), &Config::default(), gateway, &selection)
            .await
            .unwrap_err();

        assert_eq!(err.code(), &CliErrorCode::RunFailed);
        assert!(err.message().contains("connections/connection-headroom"));
    }

    #[test]
    fn test_run_checks_with_snapshot_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut snapshot = healthy_snapshot();
        snapshot.partitioned_tables = vec![PartitionedTable {
            schema: "public".to_string(),
            table: "orders".to_string(),
            partition_key: vec!["created_at".to_string()],
            key_is_expression: false,
            partition_count: 12,
            seq_scans: 0,
            idx_scans: 0,
        }];
        snapshot.query_stats_extension = true;
        snapshot.query_statistics = vec![QueryStatistic {
            query: "select * from orders where customer_id = $1".to_string(),
            calls: 5_000,
            total_exec_time_ms: 4_000_000.0,
        }];
        let path = temp_dir.path().join("snapshot.json");
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let args = RunArgs {
            snapshot: Some(path),
            only: strings(&["schema"]),
            format: Some(OutputFormat::Json),
            ..Default::default()
        };

        assert_eq!(run_checks(&args).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_execute_with_huge_run_timeout() {
        let selection = select(ALL_CHECKS, &strings(&["pg-version"]), &[]).unwrap();
        let gateway: Arc<dyn Gateway> = Arc::new(StaticGateway::new(healthy_snapshot()));
        let config = Config {
            run_timeout_secs: Some(u64::MAX),
            ..Default::default()
        };
        let ctx = RunContext::new(std::time::Duration::from_secs(u64::MAX));

        let reports = execute(ctx, &config, gateway, &selection).await.unwrap();

        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_run_without_database_fails() {
        let err = run_checks(&RunArgs::default()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_explain_unknown_check() {
        let err = explain("no-such-check").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::UnknownCheck);
        assert!(explain("pg-version").is_ok());
    }
}
