//! Filling a solved goal's hole with the prover's answer.

use anyhow::{Result, anyhow};
use core_events::GiveResult;
use core_model::{SessionModel, SessionUpdate};
use core_syntax::{GoalLabel, HoleContent, HoleId, Span};
use core_text::{Buffer, Change};
use std::ops::Range;

/// Where the replacement text ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    pub range: Range<usize>,
    pub body: String,
    pub update: SessionUpdate,
}

/// The text that replaces `hole` for `result`.
pub fn replacement_text(buffer: &Buffer, hole: &Span<HoleId>, result: &GiveResult) -> Result<String> {
    let body = || -> Result<String> {
        let text = buffer.slice(hole.from, hole.to)?;
        HoleContent::parse(&text)
            .map(|content| content.body)
            .ok_or_else(|| anyhow!("hole {} has no body to give", hole.value))
    };
    Ok(match result {
        GiveResult::Text(text) => text.clone(),
        GiveResult::Paren => format!("({})", body()?),
        GiveResult::NoParen => body()?,
    })
}

/// Replace the hole bound to `label` and leave the cursor after the new text.
///
/// The hole is deleted rather than retargeted, so its goal point goes with
/// it. Returns `None` when no hole carries `label`.
pub fn replace_hole_with(
    model: &mut SessionModel,
    label: GoalLabel,
    result: &GiveResult,
) -> Result<Option<Replaced>> {
    let Some(hole) = model.syntax().hole_by_label(label).copied() else {
        tracing::warn!(target: "actions.replace", label, "no hole for solved goal");
        return Ok(None);
    };
    let text = replacement_text(model.buffer(), &hole, result)?;
    let end = hole.from + text.encode_utf16().count();
    let update = model.edit(&[
        Change::insert(hole.from, text.clone()),
        Change::delete(hole.from, hole.to),
    ])?;
    model.set_cursor(end)?;
    tracing::debug!(
        target: "actions.replace",
        label,
        from = hole.from,
        to = end,
        "hole replaced"
    );
    Ok(Some(Replaced {
        range: hole.from..end,
        body: text,
        update,
    }))
}
