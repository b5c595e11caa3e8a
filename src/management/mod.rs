//! Management surface integration.
//!
//! # Data Flow
//! ```text
//! [identity] config
//!     → token.rs (managed identity / service principal / static token)
//!     → client.rs (GET server state, POST resume, bearer auth)
//!     → types.rs (ResourceState, ServerStatus, AutostartError)
//! ```
//!
//! # Security Constraints
//! - Client secrets ONLY from environment variables
//! - Never log tokens
//! - All management calls have a per-request timeout

pub mod client;
pub mod token;
pub mod types;

pub use client::{ManagementClient, ResumeCommand, StateQuery};
pub use token::TokenProvider;
pub use types::{
    AccessToken, AutostartError, AutostartResult, RemoteOperation, ResourceIdentity,
    ResourceState, ServerStatus,
};
