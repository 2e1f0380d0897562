//! Editing session model.
//!
//! `SessionModel` owns the buffer, the current `SyntaxState` value and the
//! cursor, and is the only place either of them changes. Every buffer edit
//! goes through [`SessionModel::edit`], which commits the changes and feeds
//! the resulting change set to the syntax state in the same call; there is no
//! way to observe the buffer after an edit whose spans were not remapped.
//!
//! Invariants (must hold after every public call):
//! * Every stored highlight, hole and goal position is valid for `buffer`.
//! * `cursor <= buffer.len()` and never splits a surrogate pair.
//! * A highlight batch with rewrites leaves the model with those rewrites
//!   committed, or with an empty syntax state when they cannot be; callers
//!   never see the intermediate state.

use anyhow::{Result, bail};
use core_syntax::{
    GoalLabel, GoalPoint, HighlightBatch, RawSpan, Span, SyntaxEvent, SyntaxState, Transition,
};
use core_text::{Assoc, Buffer, Change};
use std::ops::Range;

/// What a model call changed beyond the buffer text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    /// Goal points created.
    pub bound: Vec<Span<GoalPoint>>,
    /// Labels the prover no longer reports.
    pub eliminated: Vec<GoalLabel>,
    /// Hole rewrites committed to the buffer.
    pub rewrites: usize,
    /// The syntax state was discarded after an inconsistent edit.
    pub reset: bool,
}

impl SessionUpdate {
    fn merged(mut self, other: SessionUpdate) -> Self {
        self.bound.extend(other.bound);
        self.eliminated.extend(other.eliminated);
        self.rewrites += other.rewrites;
        self.reset |= other.reset;
        self
    }
}

#[derive(Debug)]
pub struct SessionModel {
    buffer: Buffer,
    syntax: SyntaxState,
    cursor: usize,
    status: String,
}

impl SessionModel {
    pub fn new(buffer: Buffer, placeholder_width: usize) -> Self {
        Self {
            buffer,
            syntax: SyntaxState::new(placeholder_width),
            cursor: 0,
            status: String::new(),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn syntax(&self) -> &SyntaxState {
        &self.syntax
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor; rejects positions past the end or inside a surrogate pair.
    pub fn set_cursor(&mut self, pos: usize) -> Result<()> {
        self.buffer.line_at(pos)?;
        self.cursor = pos;
        Ok(())
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
        tracing::debug!(target: "model.session", status = %self.status, "status");
    }

    /// Commit `changes` as one transaction and remap all stored spans.
    ///
    /// A rejected change list leaves buffer, cursor and syntax state untouched.
    pub fn edit(&mut self, changes: &[Change]) -> Result<SessionUpdate> {
        if changes.is_empty() {
            return Ok(SessionUpdate::default());
        }
        let set = self.buffer.apply(changes)?;
        self.cursor = set.map_pos(self.cursor, Assoc::After);
        tracing::trace!(
            target: "model.session",
            edits = set.edits().len(),
            len = self.buffer.len(),
            "edit committed"
        );
        let (update, rewrites) = self.transition(SyntaxEvent::LocalEdit(set))?;
        debug_assert!(rewrites.is_empty(), "edits never request rewrites");
        Ok(update)
    }

    /// Install a highlight response. `None` clears all highlighting.
    ///
    /// Holes that need padding are rewritten in the buffer before this returns.
    pub fn apply_highlights(&mut self, spans: Option<&[RawSpan]>) -> Result<SessionUpdate> {
        let Some(spans) = spans else {
            self.syntax = self.syntax.reset();
            self.set_status("Highlighting cleared");
            return Ok(SessionUpdate::default());
        };
        if spans.is_empty() {
            self.set_status("No highlight available");
        }
        let batch = HighlightBatch::build(&self.buffer, spans)?;
        let (mut update, rewrites) = self.transition(SyntaxEvent::HighlightBatch(batch))?;
        if !rewrites.is_empty() {
            update = match self.commit_rewrites(&rewrites) {
                Some(committed) => SessionUpdate {
                    rewrites: rewrites.len(),
                    ..update
                }
                .merged(committed),
                None => {
                    return Ok(SessionUpdate {
                        reset: true,
                        ..SessionUpdate::default()
                    });
                }
            };
        }
        if !spans.is_empty() {
            self.set_status(format!(
                "Highlighted {} ranges with doc length {}.",
                spans.len(),
                self.buffer.len()
            ));
        }
        Ok(update)
    }

    /// Install the list of goal labels the prover currently considers live.
    pub fn apply_goal_labels(&mut self, labels: Vec<GoalLabel>) -> Result<SessionUpdate> {
        let (update, _) = self.transition(SyntaxEvent::GoalLabelList(labels))?;
        if !update.eliminated.is_empty() {
            tracing::info!(
                target: "model.session",
                eliminated = ?update.eliminated,
                "goals eliminated by the prover"
            );
        }
        Ok(update)
    }

    /// Drop highlighting over `range`, typically a hole the user is working in.
    pub fn clear_range(&mut self, range: Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.buffer.len() {
            bail!(
                "cannot clear {}..{} in a buffer of {} code units",
                range.start,
                range.end,
                self.buffer.len()
            );
        }
        self.transition(SyntaxEvent::ClearRange(range))?;
        Ok(())
    }

    /// Commit the padding a highlight batch asked for. When the buffer
    /// rejects it the batch is dropped along with the rest of the syntax state.
    fn commit_rewrites(&mut self, rewrites: &[Change]) -> Option<SessionUpdate> {
        match self.edit(rewrites) {
            Ok(committed) => Some(committed),
            Err(err) => {
                tracing::warn!(
                    target: "model.session",
                    error = %format!("{err:#}"),
                    "hole rewrites rejected; resetting"
                );
                self.syntax = self.syntax.reset();
                self.set_status("Highlighting lost track of an edit; waiting for the next reload");
                None
            }
        }
    }

    fn transition(&mut self, event: SyntaxEvent) -> Result<(SessionUpdate, Vec<Change>)> {
        // a rejected event drops the state; the stand-in is a fresh generation
        let stand_in = self.syntax.reset();
        let state = std::mem::replace(&mut self.syntax, stand_in);
        let Transition {
            state,
            rewrites,
            bound,
            eliminated,
            reset,
        } = state.apply(event)?;
        self.syntax = state;
        if reset {
            self.set_status("Highlighting lost track of an edit; waiting for the next reload");
        }
        let update = SessionUpdate {
            bound,
            eliminated,
            rewrites: 0,
            reset,
        };
        Ok((update, rewrites))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn symbol(start: usize, end: usize) -> RawSpan {
        RawSpan {
            start,
            end,
            tags: vec!["symbol".into()],
            meta: None,
        }
    }

    fn hole_ranges(model: &SessionModel) -> Vec<Range<usize>> {
        model.syntax().holes().iter().map(Span::range).collect()
    }

    fn goal_positions(model: &SessionModel) -> Vec<(usize, Option<GoalLabel>)> {
        model
            .syntax()
            .goals()
            .iter()
            .map(|g| (g.from, g.value.label))
            .collect()
    }

    #[test]
    fn highlight_commits_rewrites_before_returning() {
        let mut model = SessionModel::new(Buffer::from_str("t", "f x = ?"), 2);
        let update = model.apply_highlights(Some(&[symbol(7, 8)])).unwrap();
        assert_eq!(update.rewrites, 1);
        assert_eq!(model.buffer().to_string(), "f x = {!  !}");
        assert_eq!(hole_ranges(&model), vec![6..12]);
        assert_eq!(model.status(), "Highlighted 1 ranges with doc length 12.");

        let update = model.apply_goal_labels(vec![0]).unwrap();
        assert_eq!(update.bound.len(), 1);
        assert_eq!(goal_positions(&model), vec![(12, Some(0))]);
    }

    #[test]
    fn repeated_hole_span_is_rewritten_once() {
        let mut model = SessionModel::new(Buffer::from_str("t", "f x = ?"), 2);
        let update = model
            .apply_highlights(Some(&[symbol(7, 8), symbol(7, 8)]))
            .unwrap();
        assert_eq!(update.rewrites, 1);
        assert_eq!(model.buffer().to_string(), "f x = {!  !}");
        assert_eq!(hole_ranges(&model), vec![6..12]);

        model.apply_goal_labels(vec![0]).unwrap();
        assert_eq!(goal_positions(&model), vec![(12, Some(0))]);
    }

    #[test]
    fn rejected_rewrites_reset_instead_of_half_applying() {
        let mut model = SessionModel::new(Buffer::from_str("t", "f x = ?"), 2);
        let (_, rewrites) = model
            .transition(SyntaxEvent::HighlightBatch(
                HighlightBatch::build(model.buffer(), &[symbol(7, 8)]).unwrap(),
            ))
            .unwrap();
        assert_eq!(rewrites.len(), 1);
        let doubled = [rewrites[0].clone(), rewrites[0].clone()];
        assert_eq!(model.commit_rewrites(&doubled), None);
        assert!(model.syntax().is_empty());
        assert_eq!(model.buffer().to_string(), "f x = ?");

        let update = model.apply_goal_labels(vec![0]).unwrap();
        assert!(update.bound.is_empty());
        assert!(model.syntax().goals().is_empty());
    }

    #[test]
    fn edits_move_cursor_and_spans_together() {
        let mut model = SessionModel::new(Buffer::from_str("t", "g = {! !}"), 1);
        model.apply_highlights(Some(&[symbol(5, 10)])).unwrap();
        model.apply_goal_labels(vec![2]).unwrap();
        model.set_cursor(7).unwrap();
        model.edit(&[Change::insert(7, "zero")]).unwrap();
        assert_eq!(model.buffer().to_string(), "g = {! zero!}");
        assert_eq!(model.cursor(), 11);
        assert_eq!(hole_ranges(&model), vec![4..13]);
        assert_eq!(goal_positions(&model), vec![(13, Some(2))]);
    }

    #[test]
    fn rejected_edit_changes_nothing() {
        let mut model = SessionModel::new(Buffer::from_str("t", "x = ?"), 2);
        model.apply_highlights(Some(&[symbol(5, 6)])).unwrap();
        let before = model.syntax().clone();
        assert!(model.edit(&[Change::delete(3, 40)]).is_err());
        assert_eq!(model.buffer().to_string(), "x = {!  !}");
        assert_eq!(model.syntax(), &before);
    }

    #[test]
    fn clearing_highlights_resets_state() {
        let mut model = SessionModel::new(Buffer::from_str("t", "x = {! a !}"), 2);
        model.apply_highlights(Some(&[symbol(5, 12)])).unwrap();
        let old = model.syntax().holes().iter().next().map(|h| h.value);
        model.apply_highlights(None).unwrap();
        assert!(model.syntax().is_empty());
        assert_eq!(model.status(), "Highlighting cleared");

        model.apply_highlights(Some(&[symbol(5, 12)])).unwrap();
        let new = model.syntax().holes().iter().next().map(|h| h.value);
        assert_ne!(old, new);
    }

    #[test]
    fn empty_batch_keeps_buffer_and_reports_status() {
        let mut model = SessionModel::new(Buffer::from_str("t", "x = ?"), 2);
        model.apply_highlights(Some(&[])).unwrap();
        assert_eq!(model.status(), "No highlight available");
        assert!(model.syntax().holes().is_empty());
        assert_eq!(model.buffer().to_string(), "x = ?");
    }

    #[test]
    fn cursor_and_clear_range_validate_positions() {
        let mut model = SessionModel::new(Buffer::from_str("t", "𝕁x"), 2);
        assert!(model.set_cursor(1).is_err());
        assert!(model.set_cursor(2).is_ok());
        assert!(model.clear_range(2..9).is_err());
        assert!(model.clear_range(0..3).is_ok());
    }
}
