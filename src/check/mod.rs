//! Check contract and report model
//!
//! Every diagnostic check exposes static [`CheckMetadata`] and produces a
//! [`Report`]. A report's severity is always the worst severity among its
//! findings, with [`Severity::Ok`] for a report without findings.

mod checker;
mod errors;
mod metadata;
mod report;
mod severity;

pub use checker::{CheckFuture, Checker};
pub use errors::{CheckError, CheckResult};
pub use metadata::CheckMetadata;
pub use report::{Finding, Report, Table, TableRow};
pub use severity::Severity;
