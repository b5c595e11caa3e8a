//! Bearer token sources.
//!
//! # Responsibilities
//! - Obtain a token for the management audience
//! - Map every identity-endpoint failure to `AutostartError::Auth`
//!
//! # Design Decisions
//! - No retry and no caching: a run asks exactly once and owns the result
//! - Client secrets are read from the environment, never from the config file
//! - Tokens are never logged

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::IdentityConfig;
use crate::management::types::{AccessToken, AutostartError, AutostartResult};

/// Instance metadata identity endpoint.
pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Source of bearer tokens for a given audience.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire_token(&self, scope: &str) -> AutostartResult<AccessToken>;
}

/// Build the provider selected by the `[identity]` section.
pub fn from_config(
    config: &IdentityConfig,
    timeout: Duration,
) -> AutostartResult<Box<dyn TokenProvider>> {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AutostartError::Auth(format!("cannot build identity client: {}", e)))?;

    let provider: Box<dyn TokenProvider> = match config {
        IdentityConfig::ManagedIdentity {
            endpoint,
            client_id,
        } => {
            let flavor = match endpoint {
                Some(url) => ManagedIdentityEndpoint::Imds { url: url.clone() },
                None => ManagedIdentityEndpoint::from_env(),
            };
            Box::new(ManagedIdentityTokenProvider {
                http,
                endpoint: flavor,
                client_id: client_id.clone(),
            })
        }
        IdentityConfig::ClientCredentials {
            tenant_id,
            client_id,
            client_secret_env,
            authority,
        } => {
            let client_secret = std::env::var(client_secret_env).map_err(|_| {
                AutostartError::Auth(format!(
                    "client secret variable {} is not set",
                    client_secret_env
                ))
            })?;
            Box::new(ClientCredentialsTokenProvider {
                http,
                token_url: format!("{}/{}/oauth2/token", authority.trim_end_matches('/'), tenant_id),
                client_id: client_id.clone(),
                client_secret,
            })
        }
        IdentityConfig::Static { token } => Box::new(StaticTokenProvider::new(token.clone())),
    };

    Ok(provider)
}

/// Token response shared by the identity endpoints.
///
/// `expires_on` arrives as a string of unix seconds from the managed identity
/// endpoints and from the v1 token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_on: Option<serde_json::Value>,
}

impl TokenResponse {
    fn into_token(self) -> AccessToken {
        let expires_on = match self.expires_on {
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            Some(serde_json::Value::Number(n)) => n.as_u64(),
            _ => None,
        };
        AccessToken::new(self.access_token, expires_on)
    }
}

async fn read_token(response: reqwest::Response) -> AutostartResult<AccessToken> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AutostartError::Auth(format!(
            "identity endpoint returned {}: {}",
            status, body
        )));
    }

    let parsed: TokenResponse = response
        .json()
        .await
        .map_err(|e| AutostartError::Auth(format!("malformed token response: {}", e)))?;

    if parsed.access_token.is_empty() {
        return Err(AutostartError::Auth("identity endpoint returned an empty token".into()));
    }

    Ok(parsed.into_token())
}

/// Which managed identity protocol to speak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedIdentityEndpoint {
    /// App Service style: `IDENTITY_ENDPOINT` with the `X-IDENTITY-HEADER` secret.
    AppService { url: String, header: String },
    /// Instance metadata style: `Metadata: true`.
    Imds { url: String },
}

impl ManagedIdentityEndpoint {
    /// Prefer the App Service endpoint when the platform advertises one.
    pub fn from_env() -> Self {
        match (
            std::env::var("IDENTITY_ENDPOINT"),
            std::env::var("IDENTITY_HEADER"),
        ) {
            (Ok(url), Ok(header)) => ManagedIdentityEndpoint::AppService { url, header },
            _ => ManagedIdentityEndpoint::Imds {
                url: IMDS_ENDPOINT.to_string(),
            },
        }
    }
}

/// Token from the hosting environment's managed identity.
pub struct ManagedIdentityTokenProvider {
    http: reqwest::Client,
    endpoint: ManagedIdentityEndpoint,
    client_id: Option<String>,
}

impl ManagedIdentityTokenProvider {
    pub fn new(endpoint: ManagedIdentityEndpoint, client_id: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            client_id,
        }
    }
}

#[async_trait]
impl TokenProvider for ManagedIdentityTokenProvider {
    async fn acquire_token(&self, scope: &str) -> AutostartResult<AccessToken> {
        let mut query = vec![("resource", scope.to_string())];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.clone()));
        }

        let request = match &self.endpoint {
            ManagedIdentityEndpoint::AppService { url, header } => {
                query.push(("api-version", APP_SERVICE_API_VERSION.to_string()));
                self.http
                    .get(url)
                    .header("X-IDENTITY-HEADER", header)
                    .query(&query)
            }
            ManagedIdentityEndpoint::Imds { url } => {
                query.push(("api-version", IMDS_API_VERSION.to_string()));
                self.http.get(url).header("Metadata", "true").query(&query)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| AutostartError::Auth(format!("identity endpoint unreachable: {}", e)))?;

        let token = read_token(response).await?;
        tracing::debug!(scope = %scope, expires_on = ?token.expires_on(), "Managed identity token acquired");
        Ok(token)
    }
}

/// Token for a service principal using the client-credentials grant.
pub struct ClientCredentialsTokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentialsTokenProvider {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsTokenProvider {
    async fn acquire_token(&self, scope: &str) -> AutostartResult<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("resource", scope),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AutostartError::Auth(format!("token endpoint unreachable: {}", e)))?;

        let token = read_token(response).await?;
        tracing::debug!(client_id = %self.client_id, scope = %scope, "Service principal token acquired");
        Ok(token)
    }
}

/// Fixed token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn acquire_token(&self, _scope: &str) -> AutostartResult<AccessToken> {
        Ok(AccessToken::new(self.token.clone(), None))
    }
}
