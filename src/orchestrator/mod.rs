//! Autostart orchestration.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → guard.rs (spawn run + deadline timer, cancel the loser)
//!         → run.rs (token → state → [resume] → poll until Succeeded)
//!     → outcome.rs (Ready | TimedOut | Failed, produced once)
//!     → presentation adapters (plain text, ODC document)
//! ```
//!
//! # Design Decisions
//! - Per-run state (token, endpoint) lives in a context value, never on shared objects
//! - Cancellation is cooperative; in-flight management calls finish
//! - Timeouts are values, not errors, until a caller asks for a `Result`

pub mod guard;
pub mod outcome;
pub mod run;

#[cfg(test)]
pub(crate) mod testing;

pub use guard::{TimeoutGuard, DEFAULT_DEADLINE};
pub use outcome::{OrchestrationResult, RunOutcome};
pub use run::Orchestrator;
