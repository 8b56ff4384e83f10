//! Accumulator for multi-select selections.
//!
//! Collects zero or more values for one selection before committing them as a
//! single array value. Toggling past the declared maximum is refused; confirm
//! is only permitted at or above the minimum.

use serde_json::Value;

use crate::error::SelectError;
use crate::selection::MultiSelect;

/// Transient state while a multi-select selection is being filled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiSelectState {
    pub selection: String,
    pub selected: Vec<Value>,
}

impl MultiSelectState {
    pub fn new(selection: impl Into<String>) -> Self {
        Self {
            selection: selection.into(),
            selected: Vec::new(),
        }
    }

    /// Removes the value if present, otherwise appends it.
    ///
    /// Returns `true` when the value is selected after the call. An append
    /// that would exceed `bounds.max` is a no-op returning `false`.
    pub fn toggle(&mut self, value: Value, bounds: &MultiSelect) -> bool {
        if let Some(pos) = self.selected.iter().position(|v| *v == value) {
            self.selected.remove(pos);
            return false;
        }
        if bounds.max.is_some_and(|max| self.selected.len() >= max) {
            return false;
        }
        self.selected.push(value);
        true
    }

    pub fn can_confirm(&self, bounds: &MultiSelect) -> bool {
        self.selected.len() >= bounds.min
    }

    /// Hands the collected values out for binding as one array value.
    pub fn confirm(&mut self, bounds: &MultiSelect) -> Result<Vec<Value>, SelectError> {
        if !self.can_confirm(bounds) {
            return Err(SelectError::BelowMinimum {
                selection: self.selection.clone(),
                len: self.selected.len(),
                min: bounds.min,
            });
        }
        Ok(std::mem::take(&mut self.selected))
    }
}
