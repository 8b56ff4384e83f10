//! Remote collaborator seam and the wire shapes exchanged with it.
//!
//! The game server is the authority for repeating selections (it alone knows
//! the valid next choices), for choice sets too expensive to compute locally,
//! and for executing a completed action. Implementations map these calls onto
//! whatever transport the application uses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use action_core::{Choice, PlayerId};

use crate::error::ConnectorError;

/// One iteration of the repeating-selection step protocol.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub player: PlayerId,
    pub selection_name: String,
    pub value: Value,
    pub action_name: String,
    /// Snapshot of every bound argument so far, so the server sees the
    /// selections already made earlier in the action.
    pub prior_args: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The selection is satisfied; the client commits the accumulated list.
    #[serde(default)]
    pub done: bool,
    /// Updated candidate set for the next iteration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_choices: Option<Vec<Choice>>,
    /// The whole action resolved remotely; the client tears the session down.
    #[serde(default)]
    pub action_complete: bool,
}

/// Fetch of a deferred (server-computed) choice set.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRequest {
    pub action_name: String,
    pub selection_name: String,
    pub player: PlayerId,
    pub current_args: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

/// Submission of a fully configured action.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub action_name: String,
    /// Bound arguments only; skipped selections are never transmitted.
    pub args: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Trait for the remote game server the engine coordinates with.
///
/// Different implementations can handle:
/// - A live server over HTTP/WebSocket
/// - A local game engine embedded in the same process
/// - Scripted fixtures for testing
#[async_trait]
pub trait GameServer: Send + Sync {
    /// Exchanges one value of a repeating selection and learns what comes
    /// next.
    async fn selection_step(&self, request: StepRequest) -> Result<StepResponse, ConnectorError>;

    /// Fetches a deferred choice set for a selection.
    async fn fetch_choices(&self, request: ChoiceRequest)
    -> Result<ChoiceResponse, ConnectorError>;

    /// Executes a completed action.
    async fn execute_action(
        &self,
        request: ExecuteRequest,
    ) -> Result<ExecuteResponse, ConnectorError>;

    /// Best-effort notification that an in-progress repeating selection was
    /// abandoned. Failures are ignored; local teardown has already happened.
    async fn cancel_selection(&self, _player: PlayerId, _action_name: &str, _selection_name: &str) {
    }
}
