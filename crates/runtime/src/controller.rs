//! Session controller: lifecycle, repeating coordination, and dispatch.
//!
//! Owns the single live [`ActionSession`] and every transition on it:
//! `start`, value entry, explicit skips, the repeating step protocol,
//! deferred choice fetches, submission, and cancellation. All mutation is
//! synchronous except the remote calls; after every mutation the controller
//! recomputes the cursor and candidate set and publishes the result before
//! returning, so subscribers always observe a consistent ordering.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use action_core::{
    ActionSession, ActionSpec, Candidates, Choice, ElementRef, PlayerId, RepeatingState,
    SelectError, SelectionKind, cursor,
};

use crate::bridge::{BridgeCommand, BridgeInput};
use crate::error::{Result, SessionError};
use crate::events::{ArgumentEvent, Event, EventBus, SessionEvent, TeardownReason, Topic};
use crate::server::{ChoiceRequest, ExecuteRequest, GameServer, StepRequest};

/// Drives action configuration for one player seat.
///
/// At most one session is live at a time; starting a new action implicitly
/// tears down any session still being configured.
pub struct SessionController {
    player: PlayerId,
    server: Arc<dyn GameServer>,
    bus: EventBus,
    available: Vec<ActionSpec>,
    session: Option<ActionSession>,
    /// Guards auto-start against a stale "only available action" notification
    /// arriving before the availability view refreshed after submission.
    last_executed: Option<String>,
}

impl SessionController {
    pub fn new(player: PlayerId, server: Arc<dyn GameServer>) -> Self {
        Self {
            player,
            server,
            bus: EventBus::new(),
            available: Vec::new(),
            session: None,
            last_executed: None,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to events from a specific topic.
    pub fn subscribe(&self, topic: Topic) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe(topic)
    }

    /// The session under configuration, if any.
    pub fn session(&self) -> Option<&ActionSession> {
        self.session.as_ref()
    }

    pub fn is_configuring(&self) -> bool {
        self.session.is_some()
    }

    pub fn available_actions(&self) -> &[ActionSpec] {
        &self.available
    }

    pub fn last_executed(&self) -> Option<&str> {
        self.last_executed.as_deref()
    }

    // ------------------------------------------------------------------
    // Availability reconciliation
    // ------------------------------------------------------------------

    /// Installs the currently available actions, reconciling any in-progress
    /// session against them.
    ///
    /// The session is torn down silently (not an error) when its action
    /// disappeared, or when the whole set was replaced with no overlap with
    /// the previous one. When exactly one action remains available, it is
    /// auto-started if it has zero selections (straight to submission) or its
    /// first selection is spatially interactive.
    pub async fn update_available(&mut self, actions: Vec<ActionSpec>) -> Result<()> {
        for spec in &actions {
            spec.validate()?;
        }

        if let Some(last) = &self.last_executed
            && !actions.iter().any(|a| &a.name == last)
        {
            self.last_executed = None;
        }

        if let Some(session) = &self.session {
            let action = session.action_name().to_string();
            let still_available = actions.iter().any(|a| a.name == action);
            let overlap = actions
                .iter()
                .any(|a| self.available.iter().any(|prev| prev.name == a.name));
            if !still_available || (!self.available.is_empty() && !overlap) {
                info!(%action, "in-progress action no longer available, reconciling");
                self.teardown(TeardownReason::Unavailable).await;
            }
        }

        self.available = actions;
        self.try_auto_start().await
    }

    async fn try_auto_start(&mut self) -> Result<()> {
        if self.session.is_some() || self.available.len() != 1 {
            return Ok(());
        }
        let spec = &self.available[0];
        if self.last_executed.as_deref() == Some(spec.name.as_str()) {
            // Stale notification from before the availability view refreshed.
            return Ok(());
        }
        let auto = spec.selections.is_empty()
            || spec.selections.first().is_some_and(|s| s.is_spatial());
        if !auto {
            return Ok(());
        }
        let name = spec.name.clone();
        debug!(action = %name, "auto-starting sole available action");
        self.start(&name).await
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Opens a configuration session for a named available action.
    ///
    /// An action with zero selections goes straight to submission with empty
    /// arguments.
    pub async fn start(&mut self, action: &str) -> Result<()> {
        let spec = self
            .available
            .iter()
            .find(|a| a.name == action)
            .cloned()
            .ok_or_else(|| SessionError::UnknownAction {
                action: action.to_string(),
            })?;
        spec.validate()?;

        if self.session.is_some() {
            self.teardown(TeardownReason::Superseded).await;
        }

        info!(action = %spec.name, selections = spec.selections.len(), "starting action");
        self.bus.publish(Event::Session(SessionEvent::Started {
            action: spec.name.clone(),
        }));
        self.session = Some(ActionSession::new(spec));
        self.recompute().await
    }

    /// Abandons the in-progress session.
    pub async fn cancel(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Err(SessionError::NoSession);
        }
        self.teardown(TeardownReason::Cancelled).await;
        Ok(())
    }

    /// Destroys the session and all transient state atomically. If a
    /// repeating selection was mid-protocol, the server is notified on a
    /// best-effort basis.
    async fn teardown(&mut self, reason: TeardownReason) {
        let Some(session) = self.session.take() else {
            return;
        };
        let action = session.action_name().to_string();

        if let Some(state) = &session.repeating
            && matches!(
                reason,
                TeardownReason::Cancelled
                    | TeardownReason::Superseded
                    | TeardownReason::Unavailable
            )
        {
            self.server
                .cancel_selection(self.player, &action, &state.selection)
                .await;
        }

        info!(%action, ?reason, "session torn down");
        self.bus.publish(Event::Bridge(BridgeCommand::ClearAll));
        self.bus
            .publish(Event::Session(SessionEvent::TornDown { action, reason }));
    }

    // ------------------------------------------------------------------
    // Value entry
    // ------------------------------------------------------------------

    /// Binds a value to a selection. The single mutation path for button,
    /// board, and free-form input; repeating selections are routed into the
    /// step protocol instead of the store.
    pub async fn set_value(&mut self, selection: &str, value: Value) -> Result<()> {
        let is_repeating = {
            let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
            let (_, decl) = session.spec().selection(selection).ok_or_else(|| {
                SelectError::UnknownSelection {
                    selection: selection.to_string(),
                }
            })?;
            decl.repeat.is_some()
        };
        if is_repeating {
            return self.push_repeating(selection, value).await;
        }

        {
            let session = self.session.as_mut().expect("checked above");
            session.set_value(selection, value)?;
            let value = session.args.status(selection).clone();
            self.bus.publish(Event::Arguments(ArgumentEvent::Changed {
                selection: selection.to_string(),
                value,
            }));
        }
        self.recompute().await
    }

    /// Explicitly declines an optional selection.
    pub async fn skip(&mut self, selection: &str) -> Result<()> {
        {
            let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
            session.skip(selection)?;
            let value = session.args.status(selection).clone();
            self.bus.publish(Event::Arguments(ArgumentEvent::Changed {
                selection: selection.to_string(),
                value,
            }));
        }
        self.recompute().await
    }

    /// Toggles one value in a multi-select accumulator. The argument store is
    /// untouched until [`SessionController::confirm_multi`].
    pub fn toggle(&mut self, selection: &str, value: Value) -> Result<bool> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        Ok(session.toggle(selection, value)?)
    }

    /// Commits the accumulated multi-select values as the selection's value.
    pub async fn confirm_multi(&mut self, selection: &str) -> Result<()> {
        {
            let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
            session.confirm_multi(selection)?;
            let value = session.args.status(selection).clone();
            self.bus.publish(Event::Arguments(ArgumentEvent::Changed {
                selection: selection.to_string(),
                value,
            }));
        }
        self.recompute().await
    }

    // ------------------------------------------------------------------
    // Repeating step protocol
    // ------------------------------------------------------------------

    /// Exchanges one value of a repeating selection with the server.
    ///
    /// The value is pushed speculatively and reverted if the step is rejected
    /// or the transport fails, leaving the accumulated list exactly as it
    /// was. While a step is in flight further pushes are refused.
    pub async fn push_repeating(&mut self, selection: &str, value: Value) -> Result<()> {
        let (request, has_on_each) = {
            let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
            let (index, decl) = session
                .spec()
                .selection(selection)
                .map(|(i, s)| (i, s.clone()))
                .ok_or_else(|| SelectError::UnknownSelection {
                    selection: selection.to_string(),
                })?;
            let repeat = decl
                .repeat
                .clone()
                .ok_or_else(|| SelectError::NotRepeating {
                    selection: selection.to_string(),
                })?;

            if session
                .repeating
                .as_ref()
                .is_none_or(|state| state.selection != selection)
            {
                let initial = session.available_choices_at(index);
                session.repeating = Some(RepeatingState::new(selection, initial));
            }
            let state = session.repeating.as_mut().expect("installed above");
            if state.awaiting_server {
                return Err(SessionError::StepInFlight {
                    selection: selection.to_string(),
                });
            }

            let label = state
                .current_choices
                .iter()
                .find(|c| c.bound_value(decl.kind) == value)
                .map(|c| c.label.clone());
            state.push(value.clone());
            if let Some(label) = label {
                session.cache_label(selection, &value, label);
            }

            let request = StepRequest {
                player: self.player,
                selection_name: selection.to_string(),
                value,
                action_name: session.action_name().to_string(),
                prior_args: session.args.snapshot(),
            };
            (request, repeat.has_on_each)
        };

        debug!(selection, "sending selection step");
        let result = self.server.selection_step(request).await;

        // The session may have been torn down while the step was in flight;
        // a late result then has no state to land in and is discarded.
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let Some(state) = session.repeating.as_mut() else {
            return Ok(());
        };
        if state.selection != selection {
            return Ok(());
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                state.pop_last();
                return Err(err.into());
            }
        };
        if !response.success {
            state.pop_last();
            let message = response.error.unwrap_or_else(|| "unspecified".to_string());
            warn!(selection, %message, "selection step rejected");
            return Err(SessionError::StepRejected {
                selection: selection.to_string(),
                message,
            });
        }

        if response.action_complete {
            let action = session.action_name().to_string();
            info!(%action, "server resolved the whole action during a step");
            self.last_executed = Some(action);
            self.teardown(TeardownReason::Completed).await;
            return Ok(());
        }

        if response.done {
            let values = state.take_accumulated();
            session.args.set(selection, Value::Array(values));
            session.repeating = None;
            let value = session.args.status(selection).clone();
            self.bus.publish(Event::Arguments(ArgumentEvent::Changed {
                selection: selection.to_string(),
                value,
            }));
            return self.recompute().await;
        }

        if has_on_each {
            // Items already applied remotely are not pending.
            state.accumulated.clear();
        }
        state.settle(response.next_choices);
        self.recompute().await
    }

    // ------------------------------------------------------------------
    // Bridge input
    // ------------------------------------------------------------------

    /// Routes a picking-surface notification through the same mutation path
    /// as button-driven input.
    pub async fn bridge_input(&mut self, input: BridgeInput) -> Result<()> {
        match input {
            BridgeInput::ElementClicked { element } => {
                let name = self.current_selection_name()?;
                self.bind_element(&name, element).await
            }
            BridgeInput::DragDropped { element, target } => {
                let name = self.current_selection_name()?;
                let takes_dragged = {
                    let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
                    session
                        .available_choices(&name)?
                        .iter()
                        .any(|c| c.element.as_ref() == Some(&element))
                };
                if takes_dragged {
                    // The dragged element answers the current prompt; the
                    // drop target answers whatever becomes current next.
                    self.bind_element(&name, element).await?;
                    if self.session.is_none() {
                        return Ok(());
                    }
                    let next = self.current_selection_name()?;
                    self.bind_element(&next, target).await
                } else {
                    self.bind_element(&name, target).await
                }
            }
        }
    }

    /// Resolves a picked element to the current candidate it stands for and
    /// binds that candidate's value; an element outside the candidate set
    /// binds its raw reference (last write wins either way).
    async fn bind_element(&mut self, selection: &str, element: ElementRef) -> Result<()> {
        let value = {
            let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
            let (index, decl) = session.spec().selection(selection).ok_or_else(|| {
                SelectError::UnknownSelection {
                    selection: selection.to_string(),
                }
            })?;
            let kind = decl.kind;
            session
                .available_choices_at(index)
                .into_iter()
                .find(|c| c.element.as_ref() == Some(&element))
                .map(|c| c.bound_value(kind))
                .unwrap_or(Value::String(element.0))
        };
        self.set_value(selection, value).await
    }

    /// Publishes a hover highlight for the picking surface.
    pub fn hover_choice(&self, choice: Option<Choice>) {
        self.bus
            .publish(Event::Bridge(BridgeCommand::SetHoveredChoice { choice }));
    }

    fn current_selection_name(&mut self) -> Result<String> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        let index = cursor::next_selection(session).ok_or(SessionError::NoSession)?;
        Ok(session.spec().selections[index].name.clone())
    }

    // ------------------------------------------------------------------
    // Recomputation and dispatch
    // ------------------------------------------------------------------

    /// Reruns cursor, filter, and bridge sync after a mutation. Fetches
    /// deferred choices when the cursor lands on an unfetched deferred
    /// selection, and submits the action once every selection is resolved.
    async fn recompute(&mut self) -> Result<()> {
        loop {
            let Some(session) = self.session.as_mut() else {
                return Ok(());
            };
            let Some(index) = cursor::next_selection(session) else {
                return self.submit().await;
            };

            let fetch = {
                let selection = &session.spec().selections[index];
                let needed = matches!(selection.candidates, Candidates::Deferred)
                    && !session.has_fetched(&selection.name)
                    && session
                        .repeating
                        .as_ref()
                        .is_none_or(|state| state.selection != selection.name);
                needed.then(|| {
                    (
                        selection.name.clone(),
                        ChoiceRequest {
                            action_name: session.action_name().to_string(),
                            selection_name: selection.name.clone(),
                            player: self.player,
                            current_args: session.args.snapshot(),
                        },
                    )
                })
            };
            if let Some((name, request)) = fetch {
                debug!(selection = %name, "fetching deferred choices");
                let response = self.server.fetch_choices(request).await?;
                let Some(session) = self.session.as_mut() else {
                    return Ok(());
                };
                if !response.success {
                    return Err(SessionError::ChoiceFetchFailed {
                        selection: name,
                        message: response.error.unwrap_or_else(|| "unspecified".to_string()),
                    });
                }
                session.install_fetched(name, response.choices.unwrap_or_default());
                // Re-scan: the fetched set may enable an auto-fill advance.
                continue;
            }

            let choices = session.available_choices_at(index);
            let selection = session.spec().selections[index].name.clone();
            let action = session.action_name().to_string();
            Self::sync_bridge(&self.bus, session, index, &choices);
            self.bus.publish(Event::Session(SessionEvent::Prompt {
                action,
                selection,
                choices,
            }));
            return Ok(());
        }
    }

    /// Pushes the current selection's spatial affordances to the surface.
    fn sync_bridge(bus: &EventBus, session: &ActionSession, index: usize, choices: &[Choice]) {
        let elements: Vec<ElementRef> =
            choices.iter().filter_map(|c| c.element.clone()).collect();
        let spec = session.spec();

        // Drag affordance: the element bound by the nearest earlier
        // Element-kind selection can be dragged onto the current candidates.
        let drag_source = spec.selections[index]
            .is_spatial()
            .then(|| {
                spec.selections[..index]
                    .iter()
                    .rev()
                    .filter(|s| s.kind == SelectionKind::Element)
                    .find_map(|s| session.args.value(&s.name))
                    .and_then(|v| v.as_str())
                    .map(ElementRef::new)
            })
            .flatten();

        let targets = if drag_source.is_some() {
            elements.clone()
        } else {
            Vec::new()
        };
        bus.publish(Event::Bridge(BridgeCommand::SetValidElements { elements }));
        bus.publish(Event::Bridge(BridgeCommand::SetDraggableSelectedElement {
            element: drag_source,
        }));
        bus.publish(Event::Bridge(BridgeCommand::SetDropTargets { targets }));
    }

    /// Submits the completed argument set and tears the session down
    /// regardless of the outcome. Skipped entries never reach the wire.
    async fn submit(&mut self) -> Result<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let action = session.action_name().to_string();
        let request = ExecuteRequest {
            action_name: action.clone(),
            args: session.args.snapshot(),
        };
        info!(%action, args = request.args.len(), "submitting action");

        let result = self.server.execute_action(request).await;

        self.last_executed = Some(action.clone());
        self.session = None;
        self.bus.publish(Event::Bridge(BridgeCommand::ClearAll));

        let outcome = match result {
            Ok(response) => {
                self.bus.publish(Event::Session(SessionEvent::Submitted {
                    action: action.clone(),
                    success: response.success,
                    error: response.error.clone(),
                    message: response.message,
                }));
                if response.success {
                    Ok(())
                } else {
                    Err(SessionError::ExecutionFailed {
                        action: action.clone(),
                        message: response.error.unwrap_or_else(|| "unspecified".to_string()),
                    })
                }
            }
            Err(err) => {
                self.bus.publish(Event::Session(SessionEvent::Submitted {
                    action: action.clone(),
                    success: false,
                    error: Some(err.to_string()),
                    message: None,
                }));
                Err(SessionError::Transport(err))
            }
        };

        self.bus.publish(Event::Session(SessionEvent::TornDown {
            action,
            reason: TeardownReason::Submitted,
        }));
        outcome
    }
}
