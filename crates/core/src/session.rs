//! The live configuration session for one action.
//!
//! Owns the argument store, any active sub-protocol state (repeating,
//! multi-select), the cache of fetched deferred choices, and the display-name
//! cache. Exactly one session exists at a time; tearing it down drops all of
//! this atomically.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::args::ArgumentStore;
use crate::error::SelectError;
use crate::filter::{self, value_key};
use crate::multi::MultiSelectState;
use crate::repeating::RepeatingState;
use crate::selection::{ActionSpec, Choice, Selection};

/// All transient state for the action currently being configured.
#[derive(Clone, Debug)]
pub struct ActionSession {
    spec: ActionSpec,
    pub args: ArgumentStore,
    pub repeating: Option<RepeatingState>,
    pub multi: Option<MultiSelectState>,
    /// Deferred choice sets fetched from the server, by selection name.
    fetched: BTreeMap<String, Vec<Choice>>,
    /// selection name -> value key -> last-known label. Kept independently of
    /// the choice sets so a value whose choice was later filtered away still
    /// renders.
    labels: BTreeMap<String, BTreeMap<String, String>>,
}

impl ActionSession {
    pub fn new(spec: ActionSpec) -> Self {
        Self {
            spec,
            args: ArgumentStore::new(),
            repeating: None,
            multi: None,
            fetched: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }

    pub fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    pub fn action_name(&self) -> &str {
        &self.spec.name
    }

    fn selection_index(&self, name: &str) -> Result<usize, SelectError> {
        self.spec
            .selection(name)
            .map(|(index, _)| index)
            .ok_or_else(|| SelectError::UnknownSelection {
                selection: name.to_string(),
            })
    }

    /// Effective choice set for the selection at `index`. See [`filter`].
    pub fn available_choices_at(&self, index: usize) -> Vec<Choice> {
        filter::available_choices(
            &self.spec,
            index,
            &self.args,
            self.repeating.as_ref(),
            &self.fetched,
        )
    }

    pub fn available_choices(&self, name: &str) -> Result<Vec<Choice>, SelectError> {
        Ok(self.available_choices_at(self.selection_index(name)?))
    }

    /// Binds a candidate to the selection at `index`, following the
    /// kind-specific binding rule and caching its display label.
    pub fn bind_choice(&mut self, index: usize, choice: &Choice) {
        let selection = &self.spec.selections[index];
        let name = selection.name.clone();
        let value = choice.bound_value(selection.kind);
        self.cache_label(&name, &value, choice.label.clone());
        self.args.set(name, value);
    }

    /// Binds a raw value to a selection. The single entry point for button,
    /// board, and free-form input alike; last write wins.
    ///
    /// If the value corresponds to a currently available candidate, that
    /// candidate's label is cached for later rendering.
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<(), SelectError> {
        let index = self.selection_index(name)?;
        let kind = self.spec.selections[index].kind;
        if let Some(choice) = self
            .available_choices_at(index)
            .into_iter()
            .find(|c| c.bound_value(kind) == value)
        {
            self.cache_label(name, &value, choice.label);
        }
        self.args.set(name, value);
        Ok(())
    }

    /// Marks an optional selection as explicitly declined.
    pub fn skip(&mut self, name: &str) -> Result<(), SelectError> {
        let index = self.selection_index(name)?;
        if !self.spec.selections[index].optional {
            return Err(SelectError::SkipRequired {
                selection: name.to_string(),
            });
        }
        self.args.skip(name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Multi-select sub-protocol
    // ------------------------------------------------------------------

    fn multi_selection(&self, name: &str) -> Result<&Selection, SelectError> {
        let index = self.selection_index(name)?;
        let selection = &self.spec.selections[index];
        if selection.multi_select.is_none() {
            return Err(SelectError::NotMultiSelect {
                selection: name.to_string(),
            });
        }
        Ok(selection)
    }

    /// Toggles one value in a multi-select accumulator, creating the
    /// accumulator on first use. Returns whether the value is selected after
    /// the call.
    pub fn toggle(&mut self, name: &str, value: Value) -> Result<bool, SelectError> {
        let selection = self.multi_selection(name)?;
        let bounds = selection.multi_select.expect("checked by multi_selection");
        let index = self.selection_index(name)?;
        let kind = selection.kind;

        let label = self
            .available_choices_at(index)
            .into_iter()
            .find(|c| c.bound_value(kind) == value)
            .map(|c| c.label);

        if self
            .multi
            .as_ref()
            .is_some_and(|state| state.selection != name)
        {
            // A different multi-select was left mid-flight; starting a new
            // one abandons it.
            self.multi = None;
        }
        let state = self
            .multi
            .get_or_insert_with(|| MultiSelectState::new(name));

        let selected = state.toggle(value.clone(), &bounds);
        if selected && let Some(label) = label {
            self.cache_label(name, &value, label);
        }
        Ok(selected)
    }

    /// Commits the accumulated multi-select values as one array value.
    pub fn confirm_multi(&mut self, name: &str) -> Result<(), SelectError> {
        let selection = self.multi_selection(name)?;
        let bounds = selection.multi_select.expect("checked by multi_selection");

        let state = match self.multi.as_mut() {
            Some(state) if state.selection == name => state,
            _ => {
                return Err(SelectError::BelowMinimum {
                    selection: name.to_string(),
                    len: 0,
                    min: bounds.min,
                });
            }
        };
        let values = state.confirm(&bounds)?;
        self.multi = None;
        self.args.set(name, Value::Array(values));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Deferred choices
    // ------------------------------------------------------------------

    pub fn has_fetched(&self, name: &str) -> bool {
        self.fetched.contains_key(name)
    }

    /// Installs a server-computed choice set for a deferred selection.
    pub fn install_fetched(&mut self, name: impl Into<String>, choices: Vec<Choice>) {
        self.fetched.insert(name.into(), choices);
    }

    // ------------------------------------------------------------------
    // Display labels
    // ------------------------------------------------------------------

    pub fn cache_label(&mut self, selection: &str, value: &Value, label: String) {
        self.labels
            .entry(selection.to_string())
            .or_default()
            .insert(value_key(value), label);
    }

    /// Last-known human label for a bound value, surviving re-filtering.
    pub fn display_label(&self, selection: &str, value: &Value) -> Option<&str> {
        self.labels
            .get(selection)?
            .get(&value_key(value))
            .map(String::as_str)
    }
}
