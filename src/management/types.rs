//! Resource types and error definitions.

use std::fmt;

use thiserror::Error;

/// The fixed subscription/group/server triple naming the managed server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    subscription_id: String,
    resource_group: String,
    server_name: String,
}

impl ResourceIdentity {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        server_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            server_name: server_name.into(),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// ARM path of the server, without host or query.
    pub fn resource_path(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.AnalysisServices/servers/{}",
            self.subscription_id, self.resource_group, self.server_name
        )
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.subscription_id, self.resource_group, self.server_name
        )
    }
}

/// Bearer credential for the management surface.
///
/// Owned by one orchestration run and dropped with it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    /// Expiry as unix seconds, when the issuer reported one.
    expires_on: Option<u64>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_on: Option<u64>) -> Self {
        Self {
            secret: secret.into(),
            expires_on,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_on(&self) -> Option<u64> {
        self.expires_on
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Lifecycle state reported by the management surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    Paused,
    Succeeded,
    Failed,
    /// Any other reported value, e.g. `Resuming`, `Pausing`, `Provisioning`.
    Transitioning(String),
    /// The response did not carry a state.
    Unknown,
}

impl ResourceState {
    /// Map the raw `properties.state` value. Matching is exact.
    pub fn from_remote(raw: &str) -> Self {
        match raw {
            "Paused" => ResourceState::Paused,
            "Succeeded" => ResourceState::Succeeded,
            "Failed" => ResourceState::Failed,
            other => ResourceState::Transitioning(other.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ResourceState::Succeeded)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceState::Paused => f.write_str("Paused"),
            ResourceState::Succeeded => f.write_str("Succeeded"),
            ResourceState::Failed => f.write_str("Failed"),
            ResourceState::Transitioning(state) => f.write_str(state),
            ResourceState::Unknown => f.write_str("Unknown"),
        }
    }
}

/// One observation of the server: its state and, if reported, its endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub state: ResourceState,
    /// Fully-qualified connection string (`serverFullName`).
    pub endpoint: Option<String>,
}

impl ServerStatus {
    pub fn new(state: ResourceState, endpoint: Option<String>) -> Self {
        Self { state, endpoint }
    }
}

/// Remote call that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    FetchState,
    Resume,
}

impl RemoteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteOperation::FetchState => "fetch_state",
            RemoteOperation::Resume => "resume",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can end an autostart run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutostartError {
    /// The bearer credential could not be obtained.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A management call failed. `status` is absent for transport failures.
    #[error("{operation} failed{}: {message}", status_suffix(.status))]
    Http {
        operation: RemoteOperation,
        status: Option<u16>,
        message: String,
    },

    /// Readiness was not observed before the deadline.
    #[error("server not ready after {secs} seconds")]
    Timeout { secs: u64 },

    /// The server reported ready but never reported an endpoint.
    #[error("server reported ready without a connection endpoint")]
    MissingEndpoint,

    /// The run was cancelled from outside, e.g. on shutdown.
    #[error("autostart run cancelled")]
    Cancelled,

    /// The run's task ended abnormally.
    #[error("internal error: {0}")]
    Internal(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {}", code),
        None => String::new(),
    }
}

/// Result type for autostart operations.
pub type AutostartResult<T> = Result<T, AutostartError>;
