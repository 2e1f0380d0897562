//! Goal queries: context, context with inferred type, refine.

use super::DispatchResult;
use crate::goal::{goal_at, hole_body};
use crate::{GoalQuery, ProverCommand, ProverRange};
use anyhow::Result;
use core_model::SessionModel;

pub(super) fn run(model: &mut SessionModel, query: GoalQuery) -> Result<DispatchResult> {
    let Some(goal) = goal_at(model.syntax(), model.cursor()) else {
        model.set_status("Cursor is not at a goal.");
        return Ok(DispatchResult::none());
    };
    let Some(content) = hole_body(model.buffer(), &goal.hole)? else {
        model.set_status("Hole at cursor is malformed.");
        return Ok(DispatchResult::none());
    };
    let label = goal.label;
    let command = match query {
        GoalQuery::Context => ProverCommand::GoalContext {
            label,
            body: content.body,
        },
        GoalQuery::ContextInfer => {
            let range = ProverRange::of(model.buffer(), content.range)?;
            // the answer re-highlights the hole
            model.clear_range(goal.hole.from..goal.hole.to)?;
            ProverCommand::GoalContextInfer {
                label,
                range,
                body: content.body,
            }
        }
        GoalQuery::Refine => ProverCommand::Refine {
            label,
            range: ProverRange::of(model.buffer(), content.range)?,
            body: content.body,
        },
    };
    tracing::debug!(target: "actions.dispatch", ?query, label, "goal command");
    Ok(DispatchResult::send(vec![command]))
}
