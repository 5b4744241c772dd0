//! The unit of work every diagnostic implements

use std::future::Future;
use std::pin::Pin;

use super::errors::CheckResult;
use super::metadata::CheckMetadata;
use super::report::Report;

/// Future returned by [`Checker::check`]
pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = CheckResult<Report>> + Send + 'a>>;

/// A diagnostic check.
///
/// Implementations issue only read-only queries and keep no state between
/// invocations. The runner applies the deadline around the returned future,
/// so dropping it at any await point must be harmless.
pub trait Checker: Send + Sync {
    /// Static descriptor of this check
    fn metadata(&self) -> CheckMetadata;

    /// Execute the check and produce its report
    fn check(&self) -> CheckFuture<'_>;
}
