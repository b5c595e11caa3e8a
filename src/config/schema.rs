//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the autostart
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::management::types::ResourceIdentity;

/// Root configuration for the autostart service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AutostartConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The managed server this process wakes up.
    pub resource: ResourceConfig,

    /// Management API location and per-call limits.
    pub management: ManagementConfig,

    /// Where bearer tokens come from.
    pub identity: IdentityConfig,

    /// Deadline for a single wake-up.
    pub orchestration: OrchestrationConfig,

    /// Delay between state polls.
    pub polling: PollingConfig,

    /// Connection document settings.
    pub document: DocumentConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Identity of the Analysis Services server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResourceConfig {
    pub subscription_id: String,
    pub resource_group: String,
    pub server_name: String,
}

impl ResourceConfig {
    /// Freeze the configured triple into the identity the core reads.
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(
            self.subscription_id.clone(),
            self.resource_group.clone(),
            self.server_name.clone(),
        )
    }
}

/// Management API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagementConfig {
    /// Base URL of the management surface.
    pub base_url: String,

    /// `api-version` query parameter sent on every call.
    pub api_version: String,

    /// Audience the bearer token is requested for.
    pub token_scope: String,

    /// Timeout for a single management call in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            base_url: "https://management.azure.com".to_string(),
            api_version: "2016-05-16".to_string(),
            token_scope: "https://management.core.windows.net/".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Token source selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityConfig {
    /// Managed identity of the hosting environment.
    ManagedIdentity {
        /// Override for the identity endpoint. When unset, `IDENTITY_ENDPOINT`
        /// is used if present, else the instance metadata endpoint.
        #[serde(default)]
        endpoint: Option<String>,

        /// Client ID of a user-assigned identity.
        #[serde(default)]
        client_id: Option<String>,
    },

    /// Service principal with a client secret.
    ClientCredentials {
        tenant_id: String,
        client_id: String,

        /// Name of the environment variable holding the secret.
        #[serde(default = "default_client_secret_env")]
        client_secret_env: String,

        #[serde(default = "default_authority")]
        authority: String,
    },

    /// Fixed token, for development only.
    Static { token: String },
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig::ManagedIdentity {
            endpoint: None,
            client_id: None,
        }
    }
}

fn default_client_secret_env() -> String {
    "AUTOSTART_CLIENT_SECRET".to_string()
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

/// Orchestration deadline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Time allowed for a wake-up before it is reported as timed out.
    pub deadline_secs: u64,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self { deadline_secs: 600 }
    }
}

/// Inter-poll backoff.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

/// ODC document configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DocumentConfig {
    /// Template file replacing the built-in one.
    pub template_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
