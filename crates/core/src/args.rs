//! Tri-state argument storage for an action under configuration.
//!
//! Each selection's entry is `Unset` (still needs input), `Skipped` (the
//! player explicitly declined an optional selection), or `Set` (bound). The
//! distinction between `Unset` and `Skipped` is load-bearing: a skipped entry
//! satisfies the cursor but is stripped before submission.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State of one selection's argument.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    /// Not yet answered; the cursor will surface this selection.
    #[default]
    Unset,
    /// Explicitly declined. Terminal for cursor purposes, omitted on the wire.
    Skipped,
    /// Bound to a value (a scalar, or an array for multi-select / repeating).
    Set(Value),
}

impl ArgValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// True when this entry no longer needs input.
    pub fn is_resolved(&self) -> bool {
        !self.is_unset()
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }
}

/// Mapping from selection name to its tri-state argument.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentStore {
    entries: BTreeMap<String, ArgValue>,
}

impl ArgumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a selection; absent entries read as `Unset`.
    pub fn status(&self, selection: &str) -> &ArgValue {
        static UNSET: ArgValue = ArgValue::Unset;
        self.entries.get(selection).unwrap_or(&UNSET)
    }

    pub fn value(&self, selection: &str) -> Option<&Value> {
        self.status(selection).value()
    }

    /// Binds a value. Last write wins; an existing `Set` or `Skipped` entry
    /// is overwritten.
    pub fn set(&mut self, selection: impl Into<String>, value: Value) {
        self.entries.insert(selection.into(), ArgValue::Set(value));
    }

    pub fn skip(&mut self, selection: impl Into<String>) {
        self.entries.insert(selection.into(), ArgValue::Skipped);
    }

    /// Returns the entry to `Unset`, re-opening the selection for input.
    pub fn clear(&mut self, selection: &str) {
        self.entries.remove(selection);
    }

    /// Snapshot of all bound values, keyed by selection name.
    ///
    /// `Skipped` and `Unset` entries are omitted: this is the shape that
    /// crosses the wire, both as `priorArgs` on repeating steps and as the
    /// final submission payload.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| {
                entry.value().map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
