//! Deterministic action-configuration logic shared across clients.
//!
//! `action-core` defines the canonical model for configuring a multi-parameter
//! action: declared selections, the tri-state argument store, the choice
//! filter, and the cursor that decides which selection needs input next. All
//! APIs here are pure and synchronous; anything that talks to a server (the
//! repeating-step protocol, deferred choice fetches, submission) lives in the
//! runtime crate and drives these types from the outside.
pub mod args;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod multi;
pub mod repeating;
pub mod selection;
pub mod session;

pub use args::{ArgValue, ArgumentStore};
pub use cursor::next_selection;
pub use error::SelectError;
pub use multi::MultiSelectState;
pub use repeating::RepeatingState;
pub use selection::{
    ActionSpec, Candidates, Choice, DependsOn, ElementRef, ElementTarget, FilterBy, MultiSelect,
    NumberConstraints, PlayerId, Repeat, Selection, SelectionKind, TextConstraints,
};
pub use session::ActionSession;
