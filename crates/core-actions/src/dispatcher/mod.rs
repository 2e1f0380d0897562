//! Dispatcher applying `Action`s and prover responses to the session.
//!
//! * `goal`   - goal queries that need the hole under the cursor
//! * `prover` - highlight, goal-list and give responses
//!
//! Every call returns the prover commands it produced, in send order. Status
//! text lands on the model; the caller decides how to show it.

use crate::nav::{self, Direction};
use crate::{Action, EditKind, ProverCommand};
use anyhow::Result;
use core_config::Config;
use core_model::{SessionModel, SessionUpdate};
use core_text::Change;

mod goal;
mod prover;

pub use prover::apply_prover_event;

/// Result of dispatching a single `Action` or prover event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub commands: Vec<ProverCommand>,
    pub update: SessionUpdate,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn send(commands: Vec<ProverCommand>) -> Self {
        Self {
            commands,
            update: SessionUpdate::default(),
        }
    }

    pub fn updated(update: SessionUpdate) -> Self {
        Self {
            commands: Vec::new(),
            update,
        }
    }
}

pub fn dispatch(action: Action, model: &mut SessionModel, config: &Config) -> Result<DispatchResult> {
    tracing::trace!(target: "actions.dispatch", ?action, "dispatch");
    match action {
        Action::Sync => Ok(DispatchResult::send(ProverCommand::sync(model.buffer()))),
        Action::Abort => Ok(DispatchResult::send(vec![ProverCommand::Abort])),
        Action::Navigate(direction) => {
            navigate(model, config, direction)?;
            Ok(DispatchResult::none())
        }
        Action::Goal(query) => goal::run(model, query),
        Action::MoveCursor(pos) => {
            model.set_cursor(pos)?;
            Ok(DispatchResult::none())
        }
        Action::Edit(kind) => {
            let change = match kind {
                EditKind::Insert { at, text } => Change::insert(at, text),
                EditKind::Delete { from, to } => Change::delete(from, to),
            };
            Ok(DispatchResult::updated(model.edit(&[change])?))
        }
    }
}

fn navigate(model: &mut SessionModel, config: &Config, direction: Direction) -> Result<()> {
    let holes = model.syntax().holes();
    if holes.is_empty() {
        model.set_status("No goals available");
        return Ok(());
    }
    let Some(dest) = nav::destination(holes, model.cursor(), direction, config.wrap_navigation())
    else {
        model.set_status(match direction {
            Direction::Next => "No goal below the cursor",
            Direction::Prev => "No goal above the cursor",
        });
        return Ok(());
    };
    if dest.wrapped {
        model.set_status(match direction {
            Direction::Next => "Hit bottom; continuing at top",
            Direction::Prev => "Hit top; continuing at bottom",
        });
    }
    let pos = nav::landing(model.buffer(), &dest.hole, config.cursor_offset());
    tracing::debug!(
        target: "actions.dispatch",
        hole = %dest.hole.value,
        pos,
        wrapped = dest.wrapped,
        "goto goal"
    );
    model.set_cursor(pos)
}
