//! Declaration model for actions and their selections.
//!
//! An [`ActionSpec`] is declared by the game layer at runtime: an ordered list
//! of [`Selection`]s, each carrying its kind, optionality, candidate data, and
//! the rules (filter-by, depends-on, repeat, multi-select) that shape how its
//! value is resolved. Declarations are immutable for the lifetime of a
//! configuration session; [`ActionSpec::validate`] rejects malformed ones up
//! front so the cursor and filter can assume well-formed input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SelectError;

/// Identifier of a player seat at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

/// Stable reference to an element on the spatial picking surface.
///
/// The engine never interprets the contents; it only hands refs to the bridge
/// and compares them for identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What kind of value a selection binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SelectionKind {
    /// One value from a declared (or derived) candidate list.
    Choice,
    /// A player seat.
    Player,
    /// An element on the picking surface.
    Element,
    /// A free numeric input, optionally range-constrained.
    Number,
    /// A free text input.
    Text,
}

/// One candidate value for a selection.
///
/// Every candidate source (static choices, element targets, depends-on tables,
/// server-provided sets) is normalized to this shape by the filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// The value bound into the argument store when this candidate is picked.
    pub value: Value,
    /// Human-readable label, retained in the session's display cache.
    pub label: String,
    /// Spatial reference, present when this candidate lives on the board.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementRef>,
    /// Player identity, present for `Player`-kind candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerId>,
}

impl Choice {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            element: None,
            player: None,
        }
    }

    pub fn with_element(mut self, element: ElementRef) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// The value written into the store when this candidate is bound.
    ///
    /// Binding follows the selection's kind: `Player` binds the player
    /// identifier, `Element` binds the element reference, everything else
    /// binds the underlying value. Candidates missing the kind-specific ref
    /// fall back to their value.
    pub fn bound_value(&self, kind: SelectionKind) -> Value {
        match kind {
            SelectionKind::Player => self
                .player
                .map(|p| Value::from(p.0))
                .unwrap_or_else(|| self.value.clone()),
            SelectionKind::Element => self
                .element
                .as_ref()
                .map(|e| Value::String(e.0.clone()))
                .unwrap_or_else(|| self.value.clone()),
            _ => self.value.clone(),
        }
    }
}

/// A board element offered as a pickable candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementTarget {
    pub element: ElementRef,
    pub label: String,
}

impl ElementTarget {
    pub fn new(element: ElementRef, label: impl Into<String>) -> Self {
        Self {
            element,
            label: label.into(),
        }
    }
}

/// Range constraints for `Number` selections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

/// Constraints for `Text` selections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
}

/// Kind-specific static candidate data for a selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Candidates {
    /// A declared candidate list.
    Choices(Vec<Choice>),
    /// Board elements valid for an `Element` selection.
    Elements(Vec<ElementTarget>),
    /// Free numeric input.
    Number(NumberConstraints),
    /// Free text input.
    Text(TextConstraints),
    /// Candidates are computed server-side and fetched on demand.
    Deferred,
}

impl Candidates {
    /// True when the candidate set carries an enumerable choice list
    /// (as opposed to free-form input).
    pub fn is_enumerable(&self) -> bool {
        matches!(self, Self::Choices(_) | Self::Elements(_) | Self::Deferred)
    }
}

/// Restricts a selection's choices to those whose value's field at `key`
/// equals the value already bound to the `source` selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterBy {
    pub source: String,
    pub key: String,
}

/// Swaps a selection's candidate set wholesale based on the string form of
/// another selection's bound value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DependsOn {
    pub source: String,
    pub choices_by_value: BTreeMap<String, Vec<Choice>>,
}

/// Marks a selection as server-coordinated: its final value is built one item
/// at a time through the selection-step protocol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    /// The server applies each item as it arrives; the accumulated list is
    /// cleared after every successful step.
    pub has_on_each: bool,
    /// Optional sentinel the client may offer as a "stop here" choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<Value>,
}

/// Marks a selection as accepting an array of values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiSelect {
    pub min: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

/// One declared parameter of an action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Unique key within the action.
    pub name: String,
    pub kind: SelectionKind,
    /// Optional selections may be explicitly skipped and are only prompted
    /// once every required selection is resolved.
    #[serde(default)]
    pub optional: bool,
    pub candidates: Candidates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<FilterBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_select: Option<MultiSelect>,
    /// Auto-fill eligibility: resolve silently when exactly one candidate
    /// remains.
    #[serde(default)]
    pub skip_if_only_one: bool,
}

impl Selection {
    /// Minimal constructor; rule fields start unset.
    pub fn new(name: impl Into<String>, kind: SelectionKind, candidates: Candidates) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            candidates,
            filter_by: None,
            depends_on: None,
            repeat: None,
            multi_select: None,
            skip_if_only_one: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn skip_if_only_one(mut self) -> Self {
        self.skip_if_only_one = true;
        self
    }

    pub fn filter_by(mut self, source: impl Into<String>, key: impl Into<String>) -> Self {
        self.filter_by = Some(FilterBy {
            source: source.into(),
            key: key.into(),
        });
        self
    }

    pub fn depends_on(
        mut self,
        source: impl Into<String>,
        choices_by_value: BTreeMap<String, Vec<Choice>>,
    ) -> Self {
        self.depends_on = Some(DependsOn {
            source: source.into(),
            choices_by_value,
        });
        self
    }

    pub fn repeating(mut self, repeat: Repeat) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn multi(mut self, min: usize, max: Option<usize>) -> Self {
        self.multi_select = Some(MultiSelect { min, max });
        self
    }

    /// True when picking this selection happens on the spatial surface:
    /// `Element` kind, or candidates carrying element refs.
    pub fn is_spatial(&self) -> bool {
        match &self.candidates {
            Candidates::Elements(_) => true,
            Candidates::Choices(choices) => choices.iter().any(|c| c.element.is_some()),
            _ => false,
        }
    }
}

/// A named action and the ordered selections that must be resolved before it
/// can be submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    pub selections: Vec<Selection>,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>, selections: Vec<Selection>) -> Self {
        Self {
            name: name.into(),
            selections,
        }
    }

    pub fn selection(&self, name: &str) -> Option<(usize, &Selection)> {
        self.selections
            .iter()
            .enumerate()
            .find(|(_, s)| s.name == name)
    }

    /// Rejects declarations the engine cannot resolve deterministically.
    ///
    /// Selection names must be unique; `filter_by`/`depends_on` sources must
    /// name an *earlier* selection (the cursor resolves in declaration order,
    /// so a forward reference could never be satisfied); `multi_select`
    /// bounds must be coherent; `repeat` and `multi_select` are mutually
    /// exclusive sub-protocols.
    pub fn validate(&self) -> Result<(), SelectError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.selections.len());
        for selection in &self.selections {
            if seen.contains(&selection.name.as_str()) {
                return Err(SelectError::DuplicateSelection {
                    action: self.name.clone(),
                    selection: selection.name.clone(),
                });
            }

            let check_source = |source: &str| -> Result<(), SelectError> {
                if seen.contains(&source) {
                    Ok(())
                } else {
                    Err(SelectError::InvalidSourceReference {
                        action: self.name.clone(),
                        selection: selection.name.clone(),
                        source_name: source.to_string(),
                    })
                }
            };
            if let Some(filter) = &selection.filter_by {
                check_source(&filter.source)?;
            }
            if let Some(depends) = &selection.depends_on {
                check_source(&depends.source)?;
            }

            if let Some(multi) = &selection.multi_select {
                if multi.max.is_some_and(|max| max < multi.min) {
                    return Err(SelectError::InvalidMultiSelectBounds {
                        selection: selection.name.clone(),
                        min: multi.min,
                        max: multi.max,
                    });
                }
                if selection.repeat.is_some() {
                    return Err(SelectError::ConflictingSubProtocols {
                        selection: selection.name.clone(),
                    });
                }
            }

            seen.push(&selection.name);
        }
        Ok(())
    }
}
