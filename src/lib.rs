//! On-demand wake-up for a pausable Analysis Services server.
//!
//! A request resumes the server if it is paused, waits until it reports
//! ready, and answers with its connection endpoint, all within a fixed
//! deadline.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod management;
pub mod observability;
pub mod orchestrator;
pub mod resilience;

pub use config::schema::AutostartConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use orchestrator::{OrchestrationResult, Orchestrator, TimeoutGuard};
