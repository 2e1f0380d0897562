//! Prover responses.

use super::DispatchResult;
use crate::{ProverCommand, ProverRange, replace_hole_with};
use anyhow::Result;
use core_events::ProverEvent;
use core_model::SessionModel;

/// Apply one prover response. A solved goal yields a highlight request for
/// the text that replaced it.
pub fn apply_prover_event(model: &mut SessionModel, event: ProverEvent) -> Result<DispatchResult> {
    match event {
        ProverEvent::Highlight { spans } => {
            let update = model.apply_highlights(spans.as_deref())?;
            Ok(DispatchResult::updated(update))
        }
        ProverEvent::GoalLabels { labels } => {
            let update = model.apply_goal_labels(labels)?;
            Ok(DispatchResult::updated(update))
        }
        ProverEvent::Give { label, result } => {
            let Some(replaced) = replace_hole_with(model, label, &result)? else {
                model.set_status(format!("Goal {label} is not in the buffer"));
                return Ok(DispatchResult::none());
            };
            let range = ProverRange::of(model.buffer(), replaced.range)?;
            Ok(DispatchResult {
                commands: vec![ProverCommand::Highlight {
                    label,
                    range,
                    body: replaced.body,
                }],
                update: replaced.update,
            })
        }
        ProverEvent::Status { text } => {
            model.set_status(text);
            Ok(DispatchResult::none())
        }
    }
}
