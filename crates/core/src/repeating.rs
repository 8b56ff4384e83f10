//! Transient state for a server-coordinated (repeating) selection.
//!
//! The data lives here; the step protocol that mutates it is driven by the
//! runtime coordinator, which owns the remote calls.

use serde_json::Value;

use crate::selection::Choice;

/// Per-selection state while a repeating selection is being built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RepeatingState {
    /// Name of the selection under the protocol.
    pub selection: String,
    /// Values accepted by the server so far (cleared after each step when the
    /// selection applies items as they arrive).
    pub accumulated: Vec<Value>,
    /// A step is in flight; further pushes for this selection are rejected
    /// until the server replies.
    pub awaiting_server: bool,
    /// Candidate set for the next item, as returned by the last step.
    pub current_choices: Vec<Choice>,
}

impl RepeatingState {
    pub fn new(selection: impl Into<String>, initial_choices: Vec<Choice>) -> Self {
        Self {
            selection: selection.into(),
            accumulated: Vec::new(),
            awaiting_server: false,
            current_choices: initial_choices,
        }
    }

    /// Speculatively appends a value ahead of the server round-trip. The
    /// caller reverts with [`RepeatingState::pop_last`] if the step fails.
    pub fn push(&mut self, value: Value) {
        self.accumulated.push(value);
        self.awaiting_server = true;
    }

    /// Reverts the most recent speculative push.
    pub fn pop_last(&mut self) -> Option<Value> {
        self.awaiting_server = false;
        self.accumulated.pop()
    }

    /// Marks the in-flight step as settled and installs the server's updated
    /// candidate set for the next iteration.
    pub fn settle(&mut self, next_choices: Option<Vec<Choice>>) {
        self.awaiting_server = false;
        if let Some(choices) = next_choices {
            self.current_choices = choices;
        }
    }

    /// Hands the accumulated list out as the selection's final value.
    pub fn take_accumulated(&mut self) -> Vec<Value> {
        self.awaiting_server = false;
        std::mem::take(&mut self.accumulated)
    }
}
