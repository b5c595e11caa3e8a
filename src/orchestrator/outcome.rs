//! Terminal outcomes of an autostart run.

use std::time::Duration;

use crate::management::types::{AutostartError, AutostartResult};

/// What the orchestrator itself ends with, before the deadline race is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The server reported `Succeeded`; carries the last endpoint seen.
    Ready { endpoint: String },
    /// Cancellation was observed while polling.
    Cancelled,
}

/// The single result reported for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationResult {
    Ready { endpoint: String },
    /// The deadline elapsed first. Says nothing about the server's health.
    TimedOut { deadline: Duration },
    Failed { cause: AutostartError },
}

impl OrchestrationResult {
    /// Metric/log label.
    pub fn label(&self) -> &'static str {
        match self {
            OrchestrationResult::Ready { .. } => "ready",
            OrchestrationResult::TimedOut { .. } => "timed_out",
            OrchestrationResult::Failed { .. } => "failed",
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            OrchestrationResult::Ready { endpoint } => Some(endpoint),
            _ => None,
        }
    }

    /// Collapse into a `Result`, turning a timeout into `AutostartError::Timeout`.
    pub fn into_result(self) -> AutostartResult<String> {
        match self {
            OrchestrationResult::Ready { endpoint } => Ok(endpoint),
            OrchestrationResult::TimedOut { deadline } => Err(AutostartError::Timeout {
                secs: deadline.as_secs(),
            }),
            OrchestrationResult::Failed { cause } => Err(cause),
        }
    }
}
