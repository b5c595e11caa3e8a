//! HTTP front-end.
//!
//! # Data Flow
//! ```text
//! GET / | /odc[/{database}[/{cube}]]
//!     → server.rs (request ID, trace span, per-request guarded run)
//!     → orchestrator (Ready | TimedOut | Failed)
//!     → responders.rs (plain connection string or ODC document)
//!         → document.rs (placeholder substitution)
//!     → Send to client (no-cache headers)
//! ```

pub mod document;
pub mod responders;
pub mod server;

pub use document::{DocumentParams, OdcTemplate};
pub use server::HttpServer;
