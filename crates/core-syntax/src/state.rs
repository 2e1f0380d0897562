//! The syntax state machine.
//!
//! [`SyntaxState`] is a plain value: [`SyntaxState::apply`] consumes it
//! together with one [`SyntaxEvent`] and hands back a [`Transition`] holding
//! the next state and whatever the owner has to act on (rewrites to commit,
//! goal points created, labels the prover dropped, whether a reset happened).
//!
//! Ordering contract: every buffer edit, including the rewrites a highlight
//! batch asks for, must be fed back as [`SyntaxEvent::LocalEdit`] before the
//! state is observed again. A batch with pending rewrites defers binding to
//! the edit that commits them; either way goal points are put back on their
//! hole's trailing edge after every edit, so a goal always ends up at the
//! final position of its hole.

use crate::binder::{self, BindInstruction};
use crate::highlight::{HighlightBatch, HighlightSpan};
use crate::{HoleId, InvariantViolation, RangeCollection, RemapError, Span, SyntaxError};
use core_text::{Change, ChangeSet};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// Goal number assigned by the prover.
pub type GoalLabel = u32;

/// Minimum blank width of a rewritten hole.
pub const DEFAULT_PLACEHOLDER_WIDTH: usize = 2;

/// Zero-width marker rendered at the trailing edge of its hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalPoint {
    pub hole: HoleId,
    /// `None` when the prover never numbered this goal.
    pub label: Option<GoalLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxEvent {
    /// A fresh analysis of the whole buffer.
    HighlightBatch(HighlightBatch),
    /// The goal numbers the prover currently considers live, in announcement order.
    GoalLabelList(Vec<GoalLabel>),
    /// The buffer was edited.
    LocalEdit(ChangeSet),
    /// Forget highlighting over a range the user is typing in.
    ClearRange(Range<usize>),
}

/// Outcome of [`SyntaxState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SyntaxState,
    /// Edits to commit as one transaction, in pre-edit coordinates.
    pub rewrites: Vec<Change>,
    /// Goal points created by this transition.
    pub bound: Vec<Span<GoalPoint>>,
    /// Labels that were live before and are gone now.
    pub eliminated: Vec<GoalLabel>,
    /// The previous state could not be carried over and was discarded.
    pub reset: bool,
}

impl Transition {
    fn settled(state: SyntaxState) -> Self {
        Self {
            state,
            rewrites: Vec::new(),
            bound: Vec::new(),
            eliminated: Vec::new(),
            reset: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxState {
    highlights: RangeCollection<HighlightSpan>,
    holes: RangeCollection<HoleId>,
    goals: RangeCollection<GoalPoint>,
    hole_to_goal: BTreeMap<HoleId, GoalPoint>,
    /// Holes showing an unlabeled goal point. A later label can still claim them.
    unnumbered: BTreeSet<HoleId>,
    goal_labels: Option<Vec<GoalLabel>>,
    unbound_labels: Vec<GoalLabel>,
    generation: u32,
    next_hole: u32,
    placeholder_width: usize,
}

impl Default for SyntaxState {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_WIDTH)
    }
}

impl SyntaxState {
    pub fn new(placeholder_width: usize) -> Self {
        Self {
            highlights: RangeCollection::new(),
            holes: RangeCollection::new(),
            goals: RangeCollection::new(),
            hole_to_goal: BTreeMap::new(),
            unnumbered: BTreeSet::new(),
            goal_labels: None,
            unbound_labels: Vec::new(),
            generation: 0,
            next_hole: 0,
            placeholder_width,
        }
    }

    /// The empty state, keeping configuration. Hole ids issued so far become stale.
    pub fn reset(&self) -> Self {
        Self {
            generation: self.generation.wrapping_add(1),
            ..Self::new(self.placeholder_width)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
            && self.holes.is_empty()
            && self.goals.is_empty()
            && self.hole_to_goal.is_empty()
            && self.unnumbered.is_empty()
            && self.goal_labels.is_none()
    }

    pub fn highlights(&self) -> &RangeCollection<HighlightSpan> {
        &self.highlights
    }

    pub fn holes(&self) -> &RangeCollection<HoleId> {
        &self.holes
    }

    pub fn goals(&self) -> &RangeCollection<GoalPoint> {
        &self.goals
    }

    pub fn goal_labels(&self) -> Option<&[GoalLabel]> {
        self.goal_labels.as_deref()
    }

    pub fn unbound_labels(&self) -> &[GoalLabel] {
        &self.unbound_labels
    }

    pub fn placeholder_width(&self) -> usize {
        self.placeholder_width
    }

    /// The first hole touching `pos`, edges included.
    pub fn hole_at(&self, pos: usize) -> Option<&Span<HoleId>> {
        self.holes.query_point(pos).next()
    }

    /// The labeled goal bound to `hole`.
    pub fn goal_of(&self, hole: HoleId) -> Option<&GoalPoint> {
        self.hole_to_goal.get(&hole)
    }

    /// `hole` shows a goal point the prover has not numbered.
    pub fn is_unnumbered(&self, hole: HoleId) -> bool {
        self.unnumbered.contains(&hole)
    }

    pub fn hole_by_label(&self, label: GoalLabel) -> Option<&Span<HoleId>> {
        let (hole, _) = self
            .hole_to_goal
            .iter()
            .find(|(_, goal)| goal.label == Some(label))?;
        self.holes.find(|span| span.value == *hole)
    }

    /// Highlight spans under `pos`, outermost first.
    pub fn highlights_at(&self, pos: usize) -> impl Iterator<Item = &Span<HighlightSpan>> + '_ {
        self.highlights.query_point(pos)
    }

    /// Verify the bookkeeping between holes, bindings and labels.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for hole in self.hole_to_goal.keys().chain(&self.unnumbered) {
            let Some(span) = self.holes.find(|span| span.value == *hole) else {
                return Err(InvariantViolation::UnknownHole(*hole));
            };
            let anchored = self
                .goals
                .iter()
                .any(|goal| goal.value.hole == *hole && goal.from == span.to);
            if !anchored {
                return Err(InvariantViolation::DetachedGoal(*hole));
            }
        }
        if let Some(hole) = self.unnumbered.iter().find(|h| self.hole_to_goal.contains_key(*h)) {
            return Err(InvariantViolation::NumberedAndUnnumbered(*hole));
        }
        let live = self.goal_labels.as_deref().unwrap_or_default();
        let bound = self.bound_labels();
        for label in &self.unbound_labels {
            if !live.contains(label) {
                return Err(InvariantViolation::UnboundNotLive(*label));
            }
            if bound.contains(label) {
                return Err(InvariantViolation::BoundAndUnbound(*label));
            }
        }
        Ok(())
    }

    pub fn apply(self, event: SyntaxEvent) -> Result<Transition, SyntaxError> {
        let transition = match event {
            SyntaxEvent::HighlightBatch(batch) => self.apply_highlight_batch(batch),
            SyntaxEvent::GoalLabelList(labels) => self.apply_goal_labels(labels),
            SyntaxEvent::LocalEdit(changes) => self.remap_all(&changes),
            SyntaxEvent::ClearRange(range) => self.clear_range(range)?,
        };
        debug_assert!(
            transition.state.check_invariants().is_ok(),
            "syntax state invariants violated"
        );
        Ok(transition)
    }

    fn apply_highlight_batch(mut self, batch: HighlightBatch) -> Transition {
        let HighlightBatch { highlights, holes } = batch;
        let rewrites = binder::plan_rewrites(&holes, self.placeholder_width);

        // every binding belongs to a replaced hole; its label is free again
        self.hole_to_goal.clear();
        self.unnumbered.clear();
        self.goals.clear();
        self.unbound_labels = self.goal_labels.clone().unwrap_or_default();

        let hole_spans = holes
            .iter()
            .map(|hole| Span::new(hole.from, hole.to, self.fresh_hole_id()))
            .collect();
        self.highlights = RangeCollection::from_spans(highlights);
        self.holes = RangeCollection::from_spans(hole_spans);

        tracing::debug!(
            target: "syntax.state",
            highlights = self.highlights.len(),
            holes = self.holes.len(),
            rewrites = rewrites.len(),
            "highlight batch applied"
        );

        let bound = if rewrites.is_empty() {
            self.bind_pending()
        } else {
            Vec::new()
        };
        Transition {
            rewrites,
            bound,
            ..Transition::settled(self)
        }
    }

    fn apply_goal_labels(mut self, labels: Vec<GoalLabel>) -> Transition {
        let old = self.goal_labels.take().unwrap_or_default();
        let eliminated: Vec<GoalLabel> = old
            .iter()
            .copied()
            .filter(|label| !labels.contains(label))
            .collect();
        let unbound: Vec<GoalLabel> = labels
            .iter()
            .copied()
            .filter(|label| !old.contains(label) || self.unbound_labels.contains(label))
            .collect();

        if !eliminated.is_empty() {
            let gone: Vec<HoleId> = self
                .hole_to_goal
                .iter()
                .filter(|(_, goal)| goal.label.is_some_and(|l| eliminated.contains(&l)))
                .map(|(hole, _)| *hole)
                .collect();
            for hole in &gone {
                self.hole_to_goal.remove(hole);
            }
            self.reanchor_goals();
            tracing::debug!(target: "syntax.state", eliminated = ?eliminated, "goals eliminated");
        }

        self.goal_labels = Some(labels);
        self.unbound_labels = unbound;
        let bound = self.bind_pending();
        Transition {
            bound,
            eliminated,
            ..Transition::settled(self)
        }
    }

    fn remap_all(mut self, changes: &ChangeSet) -> Transition {
        if let Err(err) = self.remap_collections(changes) {
            tracing::warn!(
                target: "syntax.state",
                error = %err,
                "failed to map highlight information through edit; resetting"
            );
            return Transition {
                reset: true,
                ..Transition::settled(self.reset())
            };
        }

        let before = self.hole_to_goal.len();
        let holes = &self.holes;
        self.hole_to_goal
            .retain(|hole, _| holes.find(|span| span.value == *hole).is_some());
        self.unnumbered
            .retain(|hole| holes.find(|span| span.value == *hole).is_some());
        if self.hole_to_goal.len() != before {
            let bound = self.bound_labels();
            self.unbound_labels = self
                .goal_labels
                .as_deref()
                .unwrap_or_default()
                .iter()
                .copied()
                .filter(|label| !bound.contains(label))
                .collect();
            tracing::trace!(
                target: "syntax.state",
                dropped = before - self.hole_to_goal.len(),
                "bindings dropped with their holes"
            );
        }
        self.reanchor_goals();

        let bound = self.bind_pending();
        Transition {
            bound,
            ..Transition::settled(self)
        }
    }

    fn clear_range(mut self, range: Range<usize>) -> Result<Transition, SyntaxError> {
        if range.start > range.end {
            return Err(SyntaxError::InvertedRange {
                from: range.start,
                to: range.end,
            });
        }
        let removed = self.highlights.remove_overlapping(range);
        tracing::trace!(target: "syntax.state", removed, "highlights cleared");
        Ok(Transition::settled(self))
    }

    /// A failure leaves the collections half mapped; callers discard the state.
    fn remap_collections(&mut self, changes: &ChangeSet) -> Result<(), RemapError> {
        self.highlights.remap(changes)?;
        self.holes.remap(changes)?;
        self.goals.remap(changes)
    }

    /// Put every goal point back on the trailing edge of its hole.
    fn reanchor_goals(&mut self) {
        let spans = self
            .holes
            .iter()
            .filter_map(|hole| {
                let goal = match self.hole_to_goal.get(&hole.value) {
                    Some(goal) => *goal,
                    None if self.unnumbered.contains(&hole.value) => GoalPoint {
                        hole: hole.value,
                        label: None,
                    },
                    None => return None,
                };
                Some(Span::point(hole.to, goal))
            })
            .collect();
        self.goals = RangeCollection::from_spans(spans);
    }

    fn bind_pending(&mut self) -> Vec<Span<GoalPoint>> {
        if self.goal_labels.is_none() {
            return Vec::new();
        }
        let instructions = binder::bind(&self.holes, &self.hole_to_goal, &self.unbound_labels);
        if instructions.is_empty() {
            return Vec::new();
        }
        let mut created = Vec::with_capacity(instructions.len());
        for BindInstruction { hole, at, label } in instructions {
            let goal = GoalPoint { hole, label };
            let fresh = match label {
                Some(_) => {
                    self.unnumbered.remove(&hole);
                    self.hole_to_goal.insert(hole, goal);
                    true
                }
                None => self.unnumbered.insert(hole),
            };
            if fresh {
                created.push(Span::point(at, goal));
            }
        }
        if created.is_empty() {
            return created;
        }
        let consumed: BTreeSet<GoalLabel> = created.iter().filter_map(|g| g.value.label).collect();
        self.unbound_labels.retain(|label| !consumed.contains(label));
        self.reanchor_goals();
        tracing::debug!(
            target: "syntax.binder",
            bound = created.len(),
            unbound = self.unbound_labels.len(),
            "goal points bound"
        );
        created
    }

    fn bound_labels(&self) -> BTreeSet<GoalLabel> {
        self.hole_to_goal
            .values()
            .filter_map(|goal| goal.label)
            .collect()
    }

    fn fresh_hole_id(&mut self) -> HoleId {
        let id = HoleId {
            generation: self.generation,
            index: self.next_hole,
        };
        self.next_hole = self.next_hole.wrapping_add(1);
        id
    }
}
