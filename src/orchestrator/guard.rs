//! Deadline race around a run.
//!
//! The run is spawned on its own task with a child cancellation token; a
//! timer runs alongside. Whichever finishes first decides the result:
//! - run first: its result (or error) is returned as-is
//! - timer first: the token is cancelled and `TimedOut` is returned at once;
//!   the run stops at its next poll and is left to unwind on its own task
//! - caller dropped mid-race: the token is cancelled the same way

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::management::types::{AutostartError, AutostartResult};
use crate::observability::metrics;
use crate::orchestrator::outcome::{OrchestrationResult, RunOutcome};
use crate::orchestrator::run::Orchestrator;

/// Deadline used by the reference deployment.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(600);

/// Races runs against a fixed deadline.
#[derive(Debug, Clone)]
pub struct TimeoutGuard {
    deadline: Duration,
    parent: Option<CancellationToken>,
}

impl TimeoutGuard {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            parent: None,
        }
    }

    /// Cancel guarded runs when `parent` is cancelled (process shutdown).
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Wake the orchestrator's server within the deadline.
    pub async fn run(&self, orchestrator: Arc<Orchestrator>) -> OrchestrationResult {
        let server = orchestrator.identity().server_name().to_string();
        self.run_with_deadline(&server, move |cancel| async move {
            orchestrator.run(cancel).await
        })
        .await
    }

    /// Race `work` against the deadline. `work` receives the token it must
    /// watch for cancellation.
    pub async fn run_with_deadline<F, Fut>(&self, server: &str, work: F) -> OrchestrationResult
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = AutostartResult<RunOutcome>> + Send + 'static,
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("autostart_run", %run_id, server = %server);
        let start = Instant::now();

        let cancel = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        // Cancels the run if this future is dropped before it settles.
        let _cancel_on_drop = cancel.clone().drop_guard();

        let mut handle = tokio::spawn(work(cancel.clone()).instrument(span.clone()));

        let finished = tokio::select! {
            joined = &mut handle => Some(joined),
            _ = tokio::time::sleep(self.deadline) => None,
        };

        let result = match finished {
            Some(joined) => settle(joined),
            None => {
                cancel.cancel();
                // Not awaited: the caller gets its answer now.
                tokio::spawn(
                    async move {
                        match handle.await {
                            Ok(_) => tracing::debug!("Abandoned run unwound"),
                            Err(e) => tracing::warn!(error = %e, "Abandoned run ended abnormally"),
                        }
                    }
                    .instrument(span.clone()),
                );
                OrchestrationResult::TimedOut {
                    deadline: self.deadline,
                }
            }
        };

        metrics::record_run(result.label(), start);
        span.in_scope(|| match &result {
            OrchestrationResult::Ready { endpoint } => {
                tracing::info!(endpoint = %endpoint, elapsed = ?start.elapsed(), "Autostart finished")
            }
            OrchestrationResult::TimedOut { deadline } => {
                tracing::warn!(deadline = ?deadline, "Autostart timed out")
            }
            OrchestrationResult::Failed { cause } => {
                tracing::error!(error = %cause, elapsed = ?start.elapsed(), "Autostart failed")
            }
        });

        result
    }
}

impl Default for TimeoutGuard {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE)
    }
}

fn settle(joined: Result<AutostartResult<RunOutcome>, JoinError>) -> OrchestrationResult {
    match joined {
        Ok(Ok(RunOutcome::Ready { endpoint })) => OrchestrationResult::Ready { endpoint },
        // Only the parent token can cancel a run that beat the timer.
        Ok(Ok(RunOutcome::Cancelled)) => OrchestrationResult::Failed {
            cause: AutostartError::Cancelled,
        },
        Ok(Err(cause)) => OrchestrationResult::Failed { cause },
        Err(e) => OrchestrationResult::Failed {
            cause: AutostartError::Internal(format!("autostart task failed: {}", e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::types::ResourceIdentity;
    use crate::orchestrator::testing::{status, Call, PanickingTokens, ScriptedRemote};

    #[tokio::test(start_paused = true)]
    async fn test_ready_before_deadline() {
        let remote = ScriptedRemote::new(vec![
            Ok(status("Paused", None)),
            Ok(status("Resuming", None)),
            Ok(status("Resuming", None)),
            Ok(status("Succeeded", Some("srv1"))),
        ]);

        let result = TimeoutGuard::default()
            .run(Arc::new(remote.orchestrator()))
            .await;

        assert_eq!(result, OrchestrationResult::Ready { endpoint: "srv1".into() });
        assert_eq!(
            remote.calls().iter().filter(|c| **c == Call::Resume).count(),
            1
        );
        assert_eq!(remote.fetch_count(), 4);
    }

    // A server stuck in Failed looks exactly like a slow resume: only the
    // deadline ends the run.
    #[tokio::test(start_paused = true)]
    async fn test_sustained_failed_state_times_out() {
        let remote = ScriptedRemote::new(vec![Ok(status("Failed", None))]);
        let guard = TimeoutGuard::default();

        let result = guard.run(Arc::new(remote.orchestrator())).await;

        assert_eq!(
            result,
            OrchestrationResult::TimedOut {
                deadline: Duration::from_secs(600)
            }
        );
        assert!(remote.fetch_count() > 1);
        assert!(!remote.calls().contains(&Call::Resume));

        let calls_at_deadline = remote.calls().len();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(remote.calls().len(), calls_at_deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_success_is_not_reported() {
        // Each poll takes 100s; Succeeded would only arrive after the deadline.
        let remote = ScriptedRemote::new(vec![
            Ok(status("Resuming", None)),
            Ok(status("Resuming", None)),
            Ok(status("Resuming", None)),
            Ok(status("Succeeded", Some("srv"))),
        ])
        .with_fetch_delay(Duration::from_secs(100));
        let orchestrator = Arc::new(remote.orchestrator());

        let result = TimeoutGuard::new(Duration::from_secs(250))
            .run(orchestrator.clone())
            .await;

        assert!(matches!(result, OrchestrationResult::TimedOut { .. }));
        let calls_at_deadline = remote.calls().len();

        // The in-flight poll finishes, then the run notices cancellation and unwinds.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(remote.calls().len(), calls_at_deadline);
        assert_eq!(Arc::strong_count(&orchestrator), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_error_is_reported_as_failure() {
        let remote = ScriptedRemote::new(vec![Ok(status("Paused", None))])
            .with_token_error(AutostartError::Auth("no identity".into()));

        let result = TimeoutGuard::default()
            .run(Arc::new(remote.orchestrator()))
            .await;

        assert_eq!(
            result,
            OrchestrationResult::Failed {
                cause: AutostartError::Auth("no identity".into())
            }
        );
        assert_eq!(remote.calls(), vec![Call::Token]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_fails_run() {
        let remote = ScriptedRemote::new(vec![Ok(status("Resuming", None))]);
        let shutdown = CancellationToken::new();
        let guard = TimeoutGuard::default().with_parent(shutdown.clone());

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let result = guard.run(Arc::new(remote.orchestrator())).await;

        assert_eq!(
            result,
            OrchestrationResult::Failed {
                cause: AutostartError::Cancelled
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_run_is_internal_failure() {
        let remote = ScriptedRemote::new(vec![Ok(status("Succeeded", Some("srv")))]);
        let orchestrator = Orchestrator::new(
            ResourceIdentity::new("sub", "rg", "cubes"),
            "scope",
            Arc::new(PanickingTokens),
            remote.clone(),
            remote.clone(),
        );

        let result = TimeoutGuard::default().run(Arc::new(orchestrator)).await;

        assert!(matches!(
            result,
            OrchestrationResult::Failed {
                cause: AutostartError::Internal(_)
            }
        ));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_cancels_run() {
        let remote = ScriptedRemote::new(vec![Ok(status("Failed", None))]);
        let orchestrator = Arc::new(remote.orchestrator());

        let caller = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move {
                TimeoutGuard::new(Duration::from_secs(5))
                    .run(orchestrator)
                    .await
            }
        });
        tokio::time::sleep(Duration::from_secs(2)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        // At most the poll already in flight may still land.
        tokio::time::sleep(Duration::from_secs(60)).await;
        let settled = remote.fetch_count();
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(remote.fetch_count(), settled);
        assert_eq!(Arc::strong_count(&orchestrator), 1);
    }
}
