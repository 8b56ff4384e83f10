//! Async orchestration for action configuration sessions.
//!
//! This crate wires the pure selection machinery from `action-core` to a
//! remote game server and an external picking surface. Consumers embed
//! [`SessionController`] to start, fill in, and submit actions, subscribe to
//! its topic-based [`EventBus`] for argument/session/bridge changes, and feed
//! board input back through the controller's entry points.
//!
//! Modules are organized by responsibility:
//! - [`controller`] hosts the session lifecycle state machine, the repeating
//!   step coordinator, and the execution dispatcher
//! - [`server`] defines the remote collaborator seam and wire shapes
//! - [`events`] provides the topic-based event bus
//! - [`bridge`] carries the commands and inputs exchanged with the spatial
//!   picking surface
pub mod bridge;
pub mod controller;
pub mod error;
pub mod events;
pub mod server;

pub use bridge::{BridgeCommand, BridgeInput};
pub use controller::SessionController;
pub use error::{ConnectorError, Result, SessionError};
pub use events::{ArgumentEvent, Event, EventBus, SessionEvent, TeardownReason, Topic};
pub use server::{
    ChoiceRequest, ChoiceResponse, ExecuteRequest, ExecuteResponse, GameServer, StepRequest,
    StepResponse,
};
