//! Observability for pgcheckup
//!
//! - Structured logging (one JSON object per line, on stderr)
//! - Typed lifecycle events
//! - Begin/complete scopes around each check
//!
//! stdout is reserved for reports; logs never go there.
//!
//! # Usage
//!
//! ```ignore
//! use pgcheckup::observability::{Logger, ObservationScope};
//!
//! Logger::info("RUN_START", &[("checks", "5")]);
//!
//! let scope = ObservationScope::with_fields("CHECK", &[("check_id", "pg-version")]);
//! // ... run the check ...
//! scope.complete_with_fields(&[("severity", "OK")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{LogLevel, Logger};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.level(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.level(), event.as_str(), fields);
}
