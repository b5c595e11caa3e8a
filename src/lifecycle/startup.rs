//! Startup wiring: config → clients → orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::AutostartConfig;
use crate::management::types::AutostartResult;
use crate::management::{token, ManagementClient};
use crate::orchestrator::{Orchestrator, TimeoutGuard};
use crate::resilience::PollBackoff;

/// Build the orchestrator for the configured server.
pub fn build_orchestrator(config: &AutostartConfig) -> AutostartResult<Orchestrator> {
    let timeout = Duration::from_secs(config.management.request_timeout_secs);
    let tokens = token::from_config(&config.identity, timeout)?;
    let client = Arc::new(ManagementClient::new(&config.management)?);

    tracing::info!(
        server = %config.resource.server_name,
        resource_group = %config.resource.resource_group,
        management = %config.management.base_url,
        "Orchestrator initialized"
    );

    Ok(Orchestrator::new(
        config.resource.identity(),
        config.management.token_scope.clone(),
        Arc::from(tokens),
        client.clone(),
        client,
    )
    .with_backoff(PollBackoff::from(&config.polling)))
}

/// Build the deadline guard; runs are cancelled when `shutdown` is.
pub fn build_guard(config: &AutostartConfig, shutdown: CancellationToken) -> TimeoutGuard {
    TimeoutGuard::new(Duration::from_secs(config.orchestration.deadline_secs)).with_parent(shutdown)
}
