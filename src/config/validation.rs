//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadline within (0, one day], backoff bounds ordered)
//! - Check that addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AutostartConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AutostartConfig, IdentityConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("listener.bind_address is not a socket address: {0}")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("polling.base_delay_ms ({base}) exceeds polling.max_delay_ms ({max})")]
    BackoffBounds { base: u64, max: u64 },

    #[error("{field} ({value}) exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

/// Upper bound for `orchestration.deadline_secs` (one day).
pub const MAX_DEADLINE_SECS: u64 = 24 * 60 * 60;

/// Check the loaded configuration, collecting every problem found.
pub fn validate_config(config: &AutostartConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.resource.subscription_id.trim().is_empty() {
        errors.push(ValidationError::Empty("resource.subscription_id"));
    }
    if config.resource.resource_group.trim().is_empty() {
        errors.push(ValidationError::Empty("resource.resource_group"));
    }
    if config.resource.server_name.trim().is_empty() {
        errors.push(ValidationError::Empty("resource.server_name"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    check_url(&mut errors, "management.base_url", &config.management.base_url);
    if config.management.token_scope.trim().is_empty() {
        errors.push(ValidationError::Empty("management.token_scope"));
    }
    if config.management.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("management.request_timeout_secs"));
    }

    match &config.identity {
        IdentityConfig::ManagedIdentity { endpoint, .. } => {
            if let Some(endpoint) = endpoint {
                check_url(&mut errors, "identity.endpoint", endpoint);
            }
        }
        IdentityConfig::ClientCredentials {
            tenant_id,
            client_id,
            client_secret_env,
            authority,
        } => {
            if tenant_id.trim().is_empty() {
                errors.push(ValidationError::Empty("identity.tenant_id"));
            }
            if client_id.trim().is_empty() {
                errors.push(ValidationError::Empty("identity.client_id"));
            }
            if client_secret_env.trim().is_empty() {
                errors.push(ValidationError::Empty("identity.client_secret_env"));
            }
            check_url(&mut errors, "identity.authority", authority);
        }
        IdentityConfig::Static { token } => {
            if token.is_empty() {
                errors.push(ValidationError::Empty("identity.token"));
            }
        }
    }

    if config.orchestration.deadline_secs == 0 {
        errors.push(ValidationError::Zero("orchestration.deadline_secs"));
    }
    if config.orchestration.deadline_secs > MAX_DEADLINE_SECS {
        errors.push(ValidationError::TooLarge {
            field: "orchestration.deadline_secs",
            value: config.orchestration.deadline_secs,
            max: MAX_DEADLINE_SECS,
        });
    }

    if config.polling.max_delay_ms == 0 {
        errors.push(ValidationError::Zero("polling.max_delay_ms"));
    }
    if config.polling.base_delay_ms > config.polling.max_delay_ms {
        errors.push(ValidationError::BackoffBounds {
            base: config.polling.base_delay_ms,
            max: config.polling.max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if url::Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
