//! Highlighting, holes and goals in buffer coordinates.
//!
//! The prover describes a checked file as a batch of highlighted spans (some
//! of which are holes) and, separately, as the list of goal numbers it
//! currently considers open. This crate keeps both in sync with the buffer:
//!
//! * [`ranges`]: sorted span collections that follow edits.
//! * [`highlight`]: translation of a raw prover batch into code units.
//! * [`hole`]: hole recognition and [`HoleId`] handles.
//! * [`binder`]: pairing labels with holes, padding empty holes.
//! * [`state`]: the [`SyntaxState`] value and its transitions.

pub mod binder;
mod error;
pub mod highlight;
pub mod hole;
pub mod ranges;
pub mod state;

pub use binder::BindInstruction;
pub use error::{InvariantViolation, RemapError, SyntaxError};
pub use highlight::{DefinitionSite, HighlightBatch, HighlightMeta, HighlightSpan, RawSpan};
pub use hole::{HoleContent, HoleId};
pub use ranges::{RangeCollection, Span};
pub use state::{
    DEFAULT_PLACEHOLDER_WIDTH, GoalLabel, GoalPoint, SyntaxEvent, SyntaxState, Transition,
};
