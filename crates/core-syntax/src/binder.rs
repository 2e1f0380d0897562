//! Pairing goal labels with holes and padding empty holes.
//!
//! Labels are handed out in the order the prover announced them to unbound
//! holes in document order. This relies on the prover numbering goals left
//! to right; when it does not, the pairing is still produced and simply
//! misattributes.

use crate::highlight::HoleCandidate;
use crate::hole::braced_inner;
use crate::{GoalLabel, GoalPoint, HoleId, RangeCollection};
use core_text::Change;
use std::collections::BTreeMap;

/// Create a goal point for `hole` at `at`, its trailing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindInstruction {
    pub hole: HoleId,
    pub at: usize,
    pub label: Option<GoalLabel>,
}

/// Walk unbound holes in document order and give each the next unbound
/// label. Holes left over once labels run out get an unlabeled goal point.
pub fn bind(
    holes: &RangeCollection<HoleId>,
    hole_to_goal: &BTreeMap<HoleId, GoalPoint>,
    unbound_labels: &[GoalLabel],
) -> Vec<BindInstruction> {
    let mut labels = unbound_labels.iter().copied();
    let instructions: Vec<_> = holes
        .iter()
        .filter(|hole| !hole_to_goal.contains_key(&hole.value))
        .map(|hole| BindInstruction {
            hole: hole.value,
            at: hole.to,
            label: labels.next(),
        })
        .collect();
    let leftover = labels.count();
    if leftover > 0 {
        tracing::trace!(target: "syntax.binder", leftover, "labels without a hole");
    }
    instructions
}

/// The placeholder an empty hole is rewritten to.
pub fn placeholder(width: usize) -> String {
    format!("{{!{}!}}", " ".repeat(width))
}

/// Rewrites for holes that would render too narrow: `?` and braced holes
/// whose content is blank and shorter than `width`.
pub fn plan_rewrites(holes: &[HoleCandidate], width: usize) -> Vec<Change> {
    holes
        .iter()
        .filter(|hole| needs_rewrite(&hole.text, width))
        .map(|hole| Change::new(hole.from, hole.to, placeholder(width)))
        .collect()
}

fn needs_rewrite(text: &str, width: usize) -> bool {
    if text == "?" {
        return true;
    }
    braced_inner(text)
        .is_some_and(|inner| inner.trim().is_empty() && inner.chars().count() < width)
}
