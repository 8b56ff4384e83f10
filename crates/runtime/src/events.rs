//! Topic-based event bus.
//!
//! The controller is the sole publisher; UI layers and the picking surface
//! subscribe to the topics they care about and feed proposed values back
//! through [`crate::SessionController`] entry points. This replaces any
//! shared mutable arguments object: state changes only travel outward as
//! events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use action_core::{ArgValue, Choice};

use crate::bridge::BridgeCommand;

/// Topics for event routing.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Session lifecycle (started, prompt, submitted, torn down).
    Session,
    /// Individual argument changes.
    Arguments,
    /// Commands for the spatial picking surface.
    Bridge,
}

/// Event wrapper that carries the topic and typed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Session(SessionEvent),
    Arguments(ArgumentEvent),
    Bridge(BridgeCommand),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Session(_) => Topic::Session,
            Event::Arguments(_) => Topic::Arguments,
            Event::Bridge(_) => Topic::Bridge,
        }
    }
}

/// Why a session was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeardownReason {
    /// Explicit cancellation by the player.
    Cancelled,
    /// A new action was started while this one was being configured.
    Superseded,
    /// The action disappeared from the available set; silent reconciliation.
    Unavailable,
    /// The argument set was submitted (successfully or not).
    Submitted,
    /// The server reported the action fully resolved during a repeating step.
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A configuration session opened for `action`.
    Started { action: String },
    /// The cursor settled on a selection; `choices` is its effective
    /// candidate set.
    Prompt {
        action: String,
        selection: String,
        choices: Vec<Choice>,
    },
    /// The action was submitted and the server replied.
    Submitted {
        action: String,
        success: bool,
        error: Option<String>,
        message: Option<String>,
    },
    /// The session and all its transient state are gone.
    TornDown {
        action: String,
        reason: TeardownReason,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArgumentEvent {
    /// A selection's entry changed; carries the new tri-state value.
    Changed { selection: String, value: ArgValue },
}

/// Topic-based event bus with a broadcast channel per topic.
///
/// Publishing is best-effort: events to a topic nobody subscribes to are
/// dropped.
#[derive(Clone)]
pub struct EventBus {
    session: broadcast::Sender<Event>,
    arguments: broadcast::Sender<Event>,
    bridge: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic.
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with the given capacity per topic.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            session: broadcast::channel(capacity).0,
            arguments: broadcast::channel(capacity).0,
            bridge: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Session => &self.session,
            Topic::Arguments => &self.arguments,
            Topic::Bridge => &self.bridge,
        }
    }

    /// Publish an event to its corresponding topic.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - normal, not an error.
            tracing::trace!(?topic, "no subscribers for topic");
        }
    }

    /// Subscribe to a specific topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
