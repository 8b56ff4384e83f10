//! Error types for declaration validation and sub-protocol misuse.
use thiserror::Error;

/// Errors raised by the pure selection machinery.
///
/// These are caller mistakes or malformed declarations, never remote
/// failures; transport and step-rejection errors live in the runtime crate.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SelectError {
    #[error("action `{action}` declares selection `{selection}` more than once")]
    DuplicateSelection { action: String, selection: String },

    #[error(
        "selection `{selection}` of action `{action}` references `{source_name}`, \
         which is not an earlier selection"
    )]
    InvalidSourceReference {
        action: String,
        selection: String,
        source_name: String,
    },

    #[error("selection `{selection}` has multi-select max {max:?} below min {min}")]
    InvalidMultiSelectBounds {
        selection: String,
        min: usize,
        max: Option<usize>,
    },

    #[error("selection `{selection}` declares both repeat and multi-select")]
    ConflictingSubProtocols { selection: String },

    #[error("action has no selection named `{selection}`")]
    UnknownSelection { selection: String },

    #[error("selection `{selection}` is not multi-select")]
    NotMultiSelect { selection: String },

    #[error("selection `{selection}` is not repeating")]
    NotRepeating { selection: String },

    #[error("selection `{selection}` is required and cannot be skipped")]
    SkipRequired { selection: String },

    #[error("multi-select `{selection}` holds {len} values, below the minimum of {min}")]
    BelowMinimum {
        selection: String,
        len: usize,
        min: usize,
    },
}
