//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AutostartConfig (validated, immutable)
//!     → shared via Arc with the server and the orchestrator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets are never stored in the file, only the name of the env var

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AutostartConfig;
pub use schema::{
    DocumentConfig, IdentityConfig, ListenerConfig, ManagementConfig, ObservabilityConfig,
    OrchestrationConfig, PollingConfig, ResourceConfig,
};
