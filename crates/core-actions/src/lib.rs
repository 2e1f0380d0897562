//! Goal navigation, hole commands and prover command rendering.
//!
//! User input arrives as [`UserEvent`]s and is lifted into [`Action`]s;
//! [`dispatch`] applies an action to the [`core_model::SessionModel`] and
//! returns the prover commands it produced. Prover responses take the other
//! path through [`apply_prover_event`].

pub mod command;
mod dispatcher;
pub mod goal;
pub mod nav;
pub mod replace;

pub use command::{ProverCommand, ProverRange};
pub use dispatcher::{DispatchResult, apply_prover_event, dispatch};
pub use goal::{GoalAtCursor, HoleBody, goal_at, hole_body};
pub use nav::{Direction, Destination, destination, landing};
pub use replace::{Replaced, replace_hole_with, replacement_text};

use core_events::UserEvent;

/// A goal-directed request that needs the goal under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalQuery {
    /// Type and context of the goal.
    Context,
    /// Type and context, plus the inferred type of the hole body.
    ContextInfer,
    /// Refine the goal with the hole body, or introduce a constructor.
    Refine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    Insert { at: usize, text: String },
    Delete { from: usize, to: usize },
}

/// High-level action requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send the buffer and reload it with highlighting.
    Sync,
    Abort,
    Navigate(Direction),
    Goal(GoalQuery),
    MoveCursor(usize),
    Edit(EditKind),
}

impl From<UserEvent> for Action {
    fn from(event: UserEvent) -> Self {
        match event {
            UserEvent::Sync => Action::Sync,
            UserEvent::Abort => Action::Abort,
            UserEvent::NextGoal => Action::Navigate(Direction::Next),
            UserEvent::PrevGoal => Action::Navigate(Direction::Prev),
            UserEvent::GoalContext => Action::Goal(GoalQuery::Context),
            UserEvent::GoalContextInfer => Action::Goal(GoalQuery::ContextInfer),
            UserEvent::Refine => Action::Goal(GoalQuery::Refine),
            UserEvent::MoveCursor { pos } => Action::MoveCursor(pos),
            UserEvent::Insert { at, text } => Action::Edit(EditKind::Insert { at, text }),
            UserEvent::Delete { from, to } => Action::Edit(EditKind::Delete { from, to }),
        }
    }
}
