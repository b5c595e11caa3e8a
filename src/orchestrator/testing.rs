//! Scripted management fakes shared by the orchestrator tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::management::client::{ResumeCommand, StateQuery};
use crate::management::token::TokenProvider;
use crate::management::types::{
    AccessToken, AutostartError, AutostartResult, ResourceIdentity, ResourceState, ServerStatus,
};
use crate::orchestrator::run::Orchestrator;
use crate::resilience::PollBackoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Token,
    Fetch,
    Resume,
}

pub fn status(state: &str, endpoint: Option<&str>) -> ServerStatus {
    ServerStatus::new(ResourceState::from_remote(state), endpoint.map(str::to_string))
}

/// Plays back a list of state answers; the last one repeats forever.
pub struct ScriptedRemote {
    script: Vec<AutostartResult<ServerStatus>>,
    cursor: Mutex<usize>,
    calls: Mutex<Vec<Call>>,
    token_error: Mutex<Option<AutostartError>>,
    resume_error: Mutex<Option<AutostartError>>,
    fetch_delay: Mutex<Duration>,
}

impl ScriptedRemote {
    pub fn new(script: Vec<AutostartResult<ServerStatus>>) -> Arc<Self> {
        assert!(!script.is_empty(), "script needs at least one answer");
        Arc::new(Self {
            script,
            cursor: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
            token_error: Mutex::new(None),
            resume_error: Mutex::new(None),
            fetch_delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn with_token_error(self: Arc<Self>, error: AutostartError) -> Arc<Self> {
        *self.token_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_resume_error(self: Arc<Self>, error: AutostartError) -> Arc<Self> {
        *self.resume_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_fetch_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.fetch_delay.lock().unwrap() = delay;
        self
    }

    pub fn orchestrator(self: &Arc<Self>) -> Orchestrator {
        Orchestrator::new(
            ResourceIdentity::new("sub", "rg", "cubes"),
            "https://management.core.windows.net/",
            self.clone(),
            self.clone(),
            self.clone(),
        )
        .with_backoff(PollBackoff::new(100, 1000))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Fetch).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TokenProvider for ScriptedRemote {
    async fn acquire_token(&self, _scope: &str) -> AutostartResult<AccessToken> {
        self.record(Call::Token);
        match self.token_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(AccessToken::new("scripted-token", None)),
        }
    }
}

#[async_trait]
impl StateQuery for ScriptedRemote {
    async fn fetch_state(
        &self,
        _identity: &ResourceIdentity,
        token: &AccessToken,
    ) -> AutostartResult<ServerStatus> {
        assert_eq!(token.secret(), "scripted-token");
        self.record(Call::Fetch);

        let answer = {
            let mut cursor = self.cursor.lock().unwrap();
            let index = (*cursor).min(self.script.len() - 1);
            *cursor += 1;
            self.script[index].clone()
        };

        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        answer
    }
}

#[async_trait]
impl ResumeCommand for ScriptedRemote {
    async fn trigger_resume(
        &self,
        _identity: &ResourceIdentity,
        token: &AccessToken,
    ) -> AutostartResult<()> {
        assert_eq!(token.secret(), "scripted-token");
        self.record(Call::Resume);
        match self.resume_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Token source that panics, for exercising task failure handling.
pub struct PanickingTokens;

#[async_trait]
impl TokenProvider for PanickingTokens {
    async fn acquire_token(&self, _scope: &str) -> AutostartResult<AccessToken> {
        panic!("token source exploded");
    }
}
