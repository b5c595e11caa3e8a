//! Management API client.
//!
//! # Responsibilities
//! - Read the server's lifecycle state and connection endpoint
//! - Issue the one-shot resume action
//! - Map non-success statuses and transport failures to `AutostartError::Http`
//!
//! # Design Decisions
//! - Parsing is defensive: missing fields mean `Unknown` / no endpoint, not an error
//! - No retries here; the caller decides what a failure means for the run
//! - Every call has a per-request timeout from `management.request_timeout_secs`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::ManagementConfig;
use crate::management::types::{
    AccessToken, AutostartError, AutostartResult, RemoteOperation, ResourceIdentity,
    ResourceState, ServerStatus,
};
use crate::observability::metrics;

/// Reads the current state of a server.
#[async_trait]
pub trait StateQuery: Send + Sync {
    async fn fetch_state(
        &self,
        identity: &ResourceIdentity,
        token: &AccessToken,
    ) -> AutostartResult<ServerStatus>;
}

/// Asks a paused server to resume. Does not wait for the resume to finish.
#[async_trait]
pub trait ResumeCommand: Send + Sync {
    async fn trigger_resume(
        &self,
        identity: &ResourceIdentity,
        token: &AccessToken,
    ) -> AutostartResult<()>;
}

/// HTTP client for the Analysis Services management surface.
#[derive(Clone)]
pub struct ManagementClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl ManagementClient {
    /// Create a new client.
    pub fn new(config: &ManagementConfig) -> AutostartResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AutostartError::Internal(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    fn server_url(&self, identity: &ResourceIdentity) -> String {
        format!("{}{}", self.base_url, identity.resource_path())
    }

    fn resume_url(&self, identity: &ResourceIdentity) -> String {
        format!("{}/resume", self.server_url(identity))
    }

    /// Send the request and fail on anything but a 2xx.
    async fn send(
        &self,
        operation: RemoteOperation,
        request: reqwest::RequestBuilder,
    ) -> AutostartResult<reqwest::Response> {
        let start = Instant::now();
        let response = request
            .query(&[("api-version", self.api_version.as_str())])
            .header(ACCEPT, "application/json")
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                metrics::record_remote_call(operation.as_str(), None, start);
                tracing::warn!(operation = %operation, error = %e, "Management call failed");
                return Err(AutostartError::Http {
                    operation,
                    status: None,
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        metrics::record_remote_call(operation.as_str(), Some(status.as_u16()), start);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(operation = %operation, status = %status, "Management call rejected");
            return Err(AutostartError::Http {
                operation,
                status: Some(status.as_u16()),
                message: error_message(&body, status),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl StateQuery for ManagementClient {
    async fn fetch_state(
        &self,
        identity: &ResourceIdentity,
        token: &AccessToken,
    ) -> AutostartResult<ServerStatus> {
        let request = self
            .http
            .get(self.server_url(identity))
            .bearer_auth(token.secret());
        let response = self.send(RemoteOperation::FetchState, request).await?;

        let body = response.text().await.map_err(|e| AutostartError::Http {
            operation: RemoteOperation::FetchState,
            status: None,
            message: format!("failed to read body: {}", e),
        })?;

        let status = parse_server_status(&body);
        tracing::debug!(
            server = %identity.server_name(),
            state = %status.state,
            endpoint = ?status.endpoint,
            "Server state fetched"
        );
        Ok(status)
    }
}

#[async_trait]
impl ResumeCommand for ManagementClient {
    async fn trigger_resume(
        &self,
        identity: &ResourceIdentity,
        token: &AccessToken,
    ) -> AutostartResult<()> {
        let request = self
            .http
            .post(self.resume_url(identity))
            .bearer_auth(token.secret())
            .body("");
        self.send(RemoteOperation::Resume, request).await?;

        tracing::info!(server = %identity.server_name(), "Resume requested");
        Ok(())
    }
}

/// Read `properties.state` and `properties.serverFullName` from a body.
///
/// Anything missing, including a body that is not JSON, yields `Unknown` and
/// no endpoint.
pub fn parse_server_status(body: &str) -> ServerStatus {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Server state response is not JSON");
            return ServerStatus::new(ResourceState::Unknown, None);
        }
    };

    let properties = value.get("properties");

    let state = properties
        .and_then(|p| p.get("state"))
        .and_then(Value::as_str)
        .map(ResourceState::from_remote)
        .unwrap_or(ResourceState::Unknown);

    let endpoint = properties
        .and_then(|p| p.get("serverFullName"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    ServerStatus::new(state, endpoint)
}

/// Prefer the ARM `error.message` over the raw body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| (!body.is_empty()).then(|| body.to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}
