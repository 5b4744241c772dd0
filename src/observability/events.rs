//! Lifecycle events
//!
//! Events are explicit and typed; each maps to a fixed event name and level.

use std::fmt;

use super::logger::LogLevel;

/// Observable events during a pgcheckup invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration file loaded
    ConfigLoaded,
    /// Instance metadata attached to the run
    InstanceMetadataLoaded,
    /// Run proceeds without instance metadata
    InstanceMetadataAbsent,
    /// Read-only session established
    GatewayConnected,
    /// A user-supplied filter matched no check or category
    FilterRejected,
    /// Orchestrator begins
    RunStart,
    /// Every selected check completed
    RunComplete,
    /// A check failed and the run was aborted
    RunAborted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::InstanceMetadataLoaded => "INSTANCE_METADATA_LOADED",
            Event::InstanceMetadataAbsent => "INSTANCE_METADATA_ABSENT",
            Event::GatewayConnected => "GATEWAY_CONNECTED",
            Event::FilterRejected => "FILTER_REJECTED",
            Event::RunStart => "RUN_START",
            Event::RunComplete => "RUN_COMPLETE",
            Event::RunAborted => "RUN_ABORTED",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> LogLevel {
        match self {
            Event::FilterRejected => LogLevel::Warn,
            Event::RunAborted => LogLevel::Error,
            Event::InstanceMetadataAbsent => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::RunStart.as_str(), "RUN_START");
        assert_eq!(Event::RunAborted.to_string(), "RUN_ABORTED");
    }

    #[test]
    fn test_event_levels() {
        assert_eq!(Event::RunAborted.level(), LogLevel::Error);
        assert_eq!(Event::FilterRejected.level(), LogLevel::Warn);
        assert_eq!(Event::RunComplete.level(), LogLevel::Info);
    }
}
