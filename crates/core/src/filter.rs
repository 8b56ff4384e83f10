//! Choice filtering: the effective candidate set for one selection.
//!
//! Pure and order-preserving relative to the declaration. Base-set
//! precedence: an active repeating protocol's server-provided choices, then a
//! `depends_on` table lookup, then fetched deferred choices, then the static
//! candidates. The base set is then narrowed by `filter_by` and by
//! cross-selection exclusion (a value bound to an earlier selection of the
//! same kind is never offered again).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::args::ArgumentStore;
use crate::repeating::RepeatingState;
use crate::selection::{ActionSpec, Candidates, Choice, Selection, SelectionKind};

/// Lookup key form of a bound value, as used by `depends_on` tables and the
/// display-label cache. Strings index by their contents, everything else by
/// compact JSON.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Computes the effective choice set for the selection at `index`.
pub fn available_choices(
    spec: &ActionSpec,
    index: usize,
    args: &ArgumentStore,
    repeating: Option<&RepeatingState>,
    fetched: &BTreeMap<String, Vec<Choice>>,
) -> Vec<Choice> {
    let selection = &spec.selections[index];
    let mut choices = base_choices(selection, args, repeating, fetched);

    if let Some(filter) = &selection.filter_by
        && let Some(source_value) = args.value(&filter.source)
    {
        choices.retain(|choice| choice.value.get(&filter.key) == Some(source_value));
    }

    apply_exclusion(spec, index, args, &mut choices);
    choices
}

fn base_choices(
    selection: &Selection,
    args: &ArgumentStore,
    repeating: Option<&RepeatingState>,
    fetched: &BTreeMap<String, Vec<Choice>>,
) -> Vec<Choice> {
    if let Some(state) = repeating
        && state.selection == selection.name
    {
        return state.current_choices.clone();
    }

    if let Some(depends) = &selection.depends_on {
        return match args.value(&depends.source) {
            Some(source_value) => depends
                .choices_by_value
                .get(&value_key(source_value))
                .cloned()
                .unwrap_or_default(),
            // Dependent selection still unset: nothing to offer yet.
            None => Vec::new(),
        };
    }

    match &selection.candidates {
        Candidates::Choices(choices) => choices.clone(),
        Candidates::Elements(targets) => targets
            .iter()
            .map(|target| {
                Choice::new(target.element.0.clone(), target.label.clone())
                    .with_element(target.element.clone())
            })
            .collect(),
        Candidates::Deferred => fetched.get(&selection.name).cloned().unwrap_or_default(),
        // Free-form input has no enumerable candidates.
        Candidates::Number(_) | Candidates::Text(_) => Vec::new(),
    }
}

/// Drops choices whose value is already bound to an earlier selection of the
/// same kind: identity for `Element`, value equality for `Choice`.
fn apply_exclusion(spec: &ActionSpec, index: usize, args: &ArgumentStore, choices: &mut Vec<Choice>) {
    let kind = spec.selections[index].kind;
    if !matches!(kind, SelectionKind::Element | SelectionKind::Choice) {
        return;
    }

    let bound: Vec<&Value> = spec.selections[..index]
        .iter()
        .filter(|earlier| earlier.kind == kind)
        .filter_map(|earlier| args.value(&earlier.name))
        .collect();
    if bound.is_empty() {
        return;
    }

    choices.retain(|choice| {
        let candidate = match kind {
            SelectionKind::Element => match &choice.element {
                Some(element) => Value::String(element.0.clone()),
                None => choice.value.clone(),
            },
            _ => choice.value.clone(),
        };
        !bound.iter().any(|value| match value {
            // Multi-select and repeating selections bind arrays; membership
            // counts as bound.
            Value::Array(items) => items.contains(&candidate),
            single => **single == candidate,
        })
    });
}
