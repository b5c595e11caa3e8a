//! The wake-up state machine.
//!
//! ```text
//! Start → TokenAcquired → InitialStateChecked → [ResumeTriggered] → Polling → Ready | Cancelled
//! ```
//!
//! One token per run, at most one resume per run (only when the first
//! observation is `Paused`), then state polls with backoff until `Succeeded`
//! or cancellation. `Failed` and `Unknown` keep the loop going; only the
//! deadline ends such a run. Any management error ends the run immediately.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::management::client::{ResumeCommand, StateQuery};
use crate::management::token::TokenProvider;
use crate::management::types::{
    AccessToken, AutostartError, AutostartResult, ResourceIdentity, ResourceState, ServerStatus,
};
use crate::observability::metrics;
use crate::orchestrator::outcome::RunOutcome;
use crate::resilience::PollBackoff;

/// Per-run state. Lives on the run's stack and is dropped with it.
struct RunContext {
    token: AccessToken,
    endpoint: Option<String>,
    resumed: bool,
    polls: u32,
}

impl RunContext {
    fn new(token: AccessToken) -> Self {
        Self {
            token,
            endpoint: None,
            resumed: false,
            polls: 0,
        }
    }

    /// Keep the newest non-empty endpoint; never forget one already seen.
    fn observe(&mut self, status: &ServerStatus) {
        if let Some(endpoint) = &status.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
    }

    fn into_ready(self) -> AutostartResult<RunOutcome> {
        let endpoint = self.endpoint.ok_or(AutostartError::MissingEndpoint)?;
        tracing::info!(
            endpoint = %endpoint,
            resumed = self.resumed,
            polls = self.polls,
            "Server ready"
        );
        Ok(RunOutcome::Ready { endpoint })
    }
}

/// Brings one server online. Holds no per-run state, so one instance serves
/// any number of concurrent runs.
pub struct Orchestrator {
    identity: ResourceIdentity,
    scope: String,
    tokens: Arc<dyn TokenProvider>,
    state: Arc<dyn StateQuery>,
    resume: Arc<dyn ResumeCommand>,
    backoff: PollBackoff,
}

impl Orchestrator {
    pub fn new(
        identity: ResourceIdentity,
        scope: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        state: Arc<dyn StateQuery>,
        resume: Arc<dyn ResumeCommand>,
    ) -> Self {
        Self {
            identity,
            scope: scope.into(),
            tokens,
            state,
            resume,
            backoff: PollBackoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: PollBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    /// Run the state machine until ready, cancelled or failed.
    ///
    /// `cancel` is only checked while polling. A call already in flight is
    /// always allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) -> AutostartResult<RunOutcome> {
        let token = self.tokens.acquire_token(&self.scope).await?;
        tracing::debug!(expires_on = ?token.expires_on(), "Token acquired");
        let mut ctx = RunContext::new(token);

        let initial = self.state.fetch_state(&self.identity, &ctx.token).await?;
        ctx.observe(&initial);
        tracing::info!(
            server = %self.identity.server_name(),
            state = %initial.state,
            "Initial server state"
        );

        match initial.state {
            ResourceState::Paused => {
                self.resume
                    .trigger_resume(&self.identity, &ctx.token)
                    .await?;
                ctx.resumed = true;
                metrics::record_resume();
            }
            ResourceState::Succeeded => return ctx.into_ready(),
            _ => {}
        }

        self.poll_until_ready(ctx, &cancel).await
    }

    /// One token and one state query, without resuming.
    pub async fn probe(&self) -> AutostartResult<ServerStatus> {
        let token = self.tokens.acquire_token(&self.scope).await?;
        self.state.fetch_state(&self.identity, &token).await
    }

    async fn poll_until_ready(
        &self,
        mut ctx: RunContext,
        cancel: &CancellationToken,
    ) -> AutostartResult<RunOutcome> {
        loop {
            let delay = self.backoff.delay(ctx.polls + 1);
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(polls = ctx.polls, "Polling cancelled");
                    return Ok(RunOutcome::Cancelled);
                }

                _ = tokio::time::sleep(delay) => {}
            }

            ctx.polls += 1;
            let status = self.state.fetch_state(&self.identity, &ctx.token).await?;
            ctx.observe(&status);

            if status.state.is_ready() {
                return ctx.into_ready();
            }

            if status.state == ResourceState::Failed {
                tracing::warn!(poll = ctx.polls, "Server reports Failed, still waiting");
            } else {
                tracing::debug!(poll = ctx.polls, state = %status.state, "Server not ready yet");
            }
        }
    }
}
