use crate::{GoalLabel, HoleId};
use core_text::{OffsetError, TextError};
use thiserror::Error;

/// A stored span cannot be resolved against the edit that is being applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemapError {
    #[error("span {from}..{to} lies outside the {len} code units the edit applies to")]
    StaleSpan { from: usize, to: usize, len: usize },
}

/// Precondition violations surfaced by batch construction and state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Offset(#[from] OffsetError),
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("range {from}..{to} ends before it starts")]
    InvertedRange { from: usize, to: usize },
}

/// Broken bookkeeping between holes, bindings and labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("binding refers to hole {0:?} which is not stored")]
    UnknownHole(HoleId),
    #[error("unbound label {0} is not a live goal label")]
    UnboundNotLive(GoalLabel),
    #[error("label {0} is both bound and unbound")]
    BoundAndUnbound(GoalLabel),
    #[error("goal point of hole {0:?} is missing or detached from its hole")]
    DetachedGoal(HoleId),
    #[error("hole {0:?} is both bound to a label and unnumbered")]
    NumberedAndUnnumbered(HoleId),
}
