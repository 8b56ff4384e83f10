//! Unified error types surfaced by the session controller.
//!
//! Wraps failures from the remote server connection and from the pure
//! selection machinery so callers can bubble them up with consistent context.
use thiserror::Error;

pub use action_core::SelectError;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Failure of the transport carrying a remote call.
///
/// The engine does not own the transport; implementations of
/// [`crate::GameServer`] map their HTTP/WebSocket/channel failures into this.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("server connection closed")]
    Closed,

    #[error("server request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no action is currently being configured")]
    NoSession,

    #[error("action `{action}` is not currently available")]
    UnknownAction { action: String },

    #[error("a step for selection `{selection}` is already awaiting the server")]
    StepInFlight { selection: String },

    #[error("selection step for `{selection}` rejected: {message}")]
    StepRejected { selection: String, message: String },

    #[error("choice fetch for `{selection}` failed: {message}")]
    ChoiceFetchFailed { selection: String, message: String },

    #[error("action `{action}` failed to execute: {message}")]
    ExecutionFailed { action: String, message: String },

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Transport(#[from] ConnectorError),
}
