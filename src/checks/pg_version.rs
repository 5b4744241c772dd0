//! Server major version

use std::sync::Arc;

use crate::check::{CheckFuture, CheckMetadata, CheckResult, Checker, Finding, Report, Severity};
use crate::gateway::{sql, SettingsQueries};
use crate::instance::InstanceMetadata;
use crate::registry::CheckDeps;

pub const CHECK_ID: &str = "pg-version";
pub const FINDING_ID: &str = "major-version";
pub const METADATA_FINDING_ID: &str = "engine-version-metadata";

/// Oldest major version still receiving fixes
pub const MIN_SUPPORTED_MAJOR: i32 = 14;
/// Majors below this are supported but worth planning an upgrade for
pub const RECOMMENDED_MAJOR: i32 = 16;

const README: &str = "\
Major versions below 14 no longer receive security fixes. Versions below 16
are still supported but approach end of life and miss planner and
monitoring improvements.

When instance metadata lists an engine version that disagrees with the
server, the metadata is stale and every check using it is suspect.";

pub fn metadata() -> CheckMetadata {
    CheckMetadata {
        check_id: CHECK_ID,
        name: "PostgreSQL version",
        category: "configs",
        description: "Checks that the server runs a supported major version",
        sql: sql::SERVER_VERSION_NUM,
        readme: README,
    }
}

pub fn build(deps: &CheckDeps) -> Box<dyn Checker> {
    Box::new(PgVersionCheck::new(
        Arc::clone(&deps.gateway),
        deps.instance.clone(),
    ))
}

/// `server_version_num` split into display form and major version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    pub major: i32,
    pub display: String,
}

impl ServerVersion {
    /// 160002 -> 16.2, 90624 -> 9.6.24
    pub fn from_num(num: i32) -> Self {
        let major = num / 10_000;
        let display = if num >= 100_000 {
            format!("{}.{}", major, num % 10_000)
        } else {
            format!("{}.{}.{}", major, (num / 100) % 100, num % 100)
        };
        Self { major, display }
    }
}

pub struct PgVersionCheck<Q: ?Sized> {
    queries: Arc<Q>,
    instance: Option<Arc<InstanceMetadata>>,
}

impl<Q: SettingsQueries + ?Sized> PgVersionCheck<Q> {
    pub fn new(queries: Arc<Q>, instance: Option<Arc<InstanceMetadata>>) -> Self {
        Self { queries, instance }
    }

    async fn evaluate(&self) -> CheckResult<Report> {
        let version = ServerVersion::from_num(self.queries.server_version_num().await?);

        let mut report = Report::new(metadata());
        report.add_finding(version_finding(&version));

        let engine_major = self.instance.as_ref().and_then(|i| i.engine_major);
        if let Some(engine_major) = engine_major {
            if i64::from(engine_major) != i64::from(version.major) {
                report.add_finding(Finding::new(
                    METADATA_FINDING_ID,
                    "Instance metadata version",
                    Severity::Warn,
                    format!(
                        "Instance metadata says major version {} but the server runs {}.",
                        engine_major, version.display
                    ),
                ));
            }
        }

        Ok(report)
    }
}

impl<Q: SettingsQueries + ?Sized> Checker for PgVersionCheck<Q> {
    fn metadata(&self) -> CheckMetadata {
        metadata()
    }

    fn check(&self) -> CheckFuture<'_> {
        Box::pin(self.evaluate())
    }
}

fn version_finding(version: &ServerVersion) -> Finding {
    let (severity, details) = if version.major < MIN_SUPPORTED_MAJOR {
        (
            Severity::Fail,
            format!(
                "PostgreSQL {} is out of support. Upgrade to {} or later.",
                version.display, RECOMMENDED_MAJOR
            ),
        )
    } else if version.major < RECOMMENDED_MAJOR {
        (
            Severity::Warn,
            format!(
                "PostgreSQL {} is supported but nearing end of life. Plan an upgrade to {} or later.",
                version.display, RECOMMENDED_MAJOR
            ),
        )
    } else {
        (
            Severity::Ok,
            format!("PostgreSQL {} is a current major version.", version.display),
        )
    };

    Finding::new(FINDING_ID, "Major version", severity, details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Snapshot, StaticGateway};

    #[test]
    fn test_version_from_num() {
        assert_eq!(ServerVersion::from_num(160002).display, "16.2");
        assert_eq!(ServerVersion::from_num(160002).major, 16);
        assert_eq!(ServerVersion::from_num(90624).display, "9.6.24");
        assert_eq!(ServerVersion::from_num(90624).major, 9);
    }

    #[test]
    fn test_version_tiers() {
        let severity = |num| version_finding(&ServerVersion::from_num(num)).severity;
        assert_eq!(severity(90624), Severity::Fail);
        assert_eq!(severity(130014), Severity::Fail);
        assert_eq!(severity(140011), Severity::Warn);
        assert_eq!(severity(150006), Severity::Warn);
        assert_eq!(severity(160002), Severity::Ok);
        assert_eq!(severity(170000), Severity::Ok);
    }

    async fn run(num: i32, instance: Option<InstanceMetadata>) -> Report {
        let gateway = StaticGateway::new(Snapshot {
            server_version_num: Some(num),
            ..Default::default()
        });
        PgVersionCheck::new(Arc::new(gateway), instance.map(Arc::new))
            .check()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_metadata_mismatch_warns() {
        let instance = InstanceMetadata::from_json(r#"{"engine_version": "15.4"}"#).unwrap();
        let report = run(160002, Some(instance)).await;

        assert_eq!(report.severity(), Severity::Warn);
        assert!(report.finding(METADATA_FINDING_ID).is_some());
    }

    #[tokio::test]
    async fn test_matching_metadata_adds_nothing() {
        let instance = InstanceMetadata::from_json(r#"{"engine_version": "16.2"}"#).unwrap();
        let report = run(160002, Some(instance)).await;

        assert_eq!(report.severity(), Severity::Ok);
        assert_eq!(report.findings().len(), 1);
    }
}
