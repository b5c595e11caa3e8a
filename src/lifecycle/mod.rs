//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build token source + management client → Orchestrator
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Cancel in-flight runs → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then clients, then listener
//! - In-flight runs are cancelled on shutdown instead of waiting out their deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_guard, build_orchestrator};
