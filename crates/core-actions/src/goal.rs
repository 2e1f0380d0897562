//! Finding the goal under the cursor and reading a hole's body.

use core_syntax::{GoalLabel, HoleContent, HoleId, Span, SyntaxState};
use core_text::{Buffer, TextError};
use std::ops::Range;

/// A numbered goal whose hole touches the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalAtCursor {
    pub hole: Span<HoleId>,
    pub label: GoalLabel,
}

/// The hole touching `pos` (edges included), provided the prover has
/// numbered its goal.
pub fn goal_at(syntax: &SyntaxState, pos: usize) -> Option<GoalAtCursor> {
    let hole = *syntax.hole_at(pos)?;
    let label = syntax.goal_of(hole.value)?.label?;
    Some(GoalAtCursor { hole, label })
}

/// What the user typed inside a hole and where it sits in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleBody {
    pub body: String,
    pub range: Range<usize>,
}

/// Parse the current text of `hole`. `None` when the hole is blank or no
/// longer looks like a braced hole.
pub fn hole_body(buffer: &Buffer, hole: &Span<HoleId>) -> Result<Option<HoleBody>, TextError> {
    let text = buffer.slice(hole.from, hole.to)?;
    Ok(HoleContent::parse(&text).map(|content| HoleBody {
        range: hole.from + content.trim_before..hole.to - content.trim_after,
        body: content.body,
    }))
}
