//! Scripted game server for driving the controller in tests.

use std::collections::VecDeque;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use action_core::PlayerId;
use action_runtime::{
    ChoiceRequest, ChoiceResponse, ConnectorError, ExecuteRequest, ExecuteResponse, GameServer,
    StepRequest, StepResponse,
};

/// Installs a test-writer tracing subscriber once per test binary.
/// Filter with `RUST_LOG`, e.g. `RUST_LOG=action_runtime=debug`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
            .with_test_writer()
            .try_init();
    });
}

/// Replays canned responses in order and records every request it saw.
///
/// An empty queue yields a bare success response, so tests only script the
/// interesting replies.
#[derive(Default)]
pub struct ScriptedServer {
    steps: Mutex<VecDeque<Result<StepResponse, ConnectorError>>>,
    choices: Mutex<VecDeque<Result<ChoiceResponse, ConnectorError>>>,
    executions: Mutex<VecDeque<Result<ExecuteResponse, ConnectorError>>>,
    pub step_requests: Mutex<Vec<StepRequest>>,
    pub choice_requests: Mutex<Vec<ChoiceRequest>>,
    pub execute_requests: Mutex<Vec<ExecuteRequest>>,
    pub cancellations: Mutex<Vec<(PlayerId, String, String)>>,
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_step(&self, response: Result<StepResponse, ConnectorError>) {
        self.steps.lock().unwrap().push_back(response);
    }

    pub fn push_choices(&self, response: Result<ChoiceResponse, ConnectorError>) {
        self.choices.lock().unwrap().push_back(response);
    }

    pub fn push_execution(&self, response: Result<ExecuteResponse, ConnectorError>) {
        self.executions.lock().unwrap().push_back(response);
    }

    pub fn executed(&self) -> Vec<ExecuteRequest> {
        self.execute_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GameServer for ScriptedServer {
    async fn selection_step(&self, request: StepRequest) -> Result<StepResponse, ConnectorError> {
        self.step_requests.lock().unwrap().push(request);
        self.steps.lock().unwrap().pop_front().unwrap_or(Ok(StepResponse {
            success: true,
            done: true,
            ..Default::default()
        }))
    }

    async fn fetch_choices(
        &self,
        request: ChoiceRequest,
    ) -> Result<ChoiceResponse, ConnectorError> {
        self.choice_requests.lock().unwrap().push(request);
        self.choices.lock().unwrap().pop_front().unwrap_or(Ok(ChoiceResponse {
            success: true,
            choices: Some(Vec::new()),
            ..Default::default()
        }))
    }

    async fn execute_action(
        &self,
        request: ExecuteRequest,
    ) -> Result<ExecuteResponse, ConnectorError> {
        self.execute_requests.lock().unwrap().push(request);
        self.executions.lock().unwrap().pop_front().unwrap_or(Ok(ExecuteResponse {
            success: true,
            ..Default::default()
        }))
    }

    async fn cancel_selection(&self, player: PlayerId, action_name: &str, selection_name: &str) {
        self.cancellations.lock().unwrap().push((
            player,
            action_name.to_string(),
            selection_name.to_string(),
        ));
    }
}
