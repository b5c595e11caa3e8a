//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Polling loop in the orchestrator:
//!     → backoff.rs (delay before the next state query)
//!     → cancellable sleep (deadline or shutdown ends the wait early)
//! ```
//!
//! # Design Decisions
//! - Failed management calls are never retried; only the readiness poll repeats
//! - Delays grow exponentially up to `max_delay_ms`, with jitter

pub mod backoff;

pub use backoff::{calculate_backoff, PollBackoff};
