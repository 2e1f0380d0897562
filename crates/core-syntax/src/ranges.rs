//! Ordered collections of tagged intervals that follow buffer edits.
//!
//! A [`RangeCollection`] keeps its spans sorted by `from` (stable for ties,
//! so nested spans keep their relative order) and never holds a span with
//! `from > to`. Overlap between spans of the same collection is allowed.

use crate::RemapError;
use core_text::{Assoc, ChangeSet};
use std::ops::Range;

/// Half-open interval `[from, to)` over code units with an immutable payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<T> {
    pub from: usize,
    pub to: usize,
    pub value: T,
}

impl<T> Span<T> {
    pub fn new(from: usize, to: usize, value: T) -> Self {
        debug_assert!(from <= to, "span must not be inverted");
        Self { from, to, value }
    }

    /// A zero-width span at `at`.
    pub fn point(at: usize, value: T) -> Self {
        Self::new(at, at, value)
    }

    pub fn range(&self) -> Range<usize> {
        self.from..self.to
    }

    pub fn is_point(&self) -> bool {
        self.from == self.to
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.from <= pos && pos <= self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeCollection<T> {
    spans: Vec<Span<T>>,
}

impl<T> Default for RangeCollection<T> {
    fn default() -> Self {
        Self { spans: Vec::new() }
    }
}

impl<T> RangeCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spans(spans: Vec<Span<T>>) -> Self {
        let mut collection = Self::new();
        collection.add(spans);
        collection
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span<T>> {
        self.spans.iter()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Merge `spans` into the sorted order. Existing spans keep their place
    /// ahead of new spans with the same `from`.
    pub fn add(&mut self, mut spans: Vec<Span<T>>) {
        if spans.is_empty() {
            return;
        }
        spans.sort_by_key(|s| s.from);
        if self.spans.last().is_none_or(|last| last.from <= spans[0].from) {
            self.spans.append(&mut spans);
            return;
        }
        let existing = std::mem::take(&mut self.spans);
        let mut merged = Vec::with_capacity(existing.len() + spans.len());
        let mut incoming = spans.into_iter().peekable();
        for span in existing {
            while let Some(new) = incoming.next_if(|n| n.from < span.from) {
                merged.push(new);
            }
            merged.push(span);
        }
        merged.extend(incoming);
        self.spans = merged;
    }

    /// Drop every span for which `pred(from, to)` holds.
    pub fn remove_where(&mut self, mut pred: impl FnMut(usize, usize) -> bool) -> usize {
        let before = self.spans.len();
        self.spans.retain(|s| !pred(s.from, s.to));
        before - self.spans.len()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Span<T>) -> bool) {
        self.spans.retain(|s| keep(s));
    }

    /// Drop spans overlapping `range`; see [`RangeCollection::query_range`]
    /// for the overlap rule.
    pub fn remove_overlapping(&mut self, range: Range<usize>) -> usize {
        self.remove_where(|from, to| overlaps(from, to, &range))
    }

    /// Spans with `from <= pos <= to`, ascending by `from`.
    pub fn query_point(&self, pos: usize) -> impl Iterator<Item = &Span<T>> + '_ {
        self.spans
            .iter()
            .take_while(move |s| s.from <= pos)
            .filter(move |s| pos <= s.to)
    }

    /// Spans overlapping `range`, ascending by `from`. An empty `range` only
    /// meets spans that strictly contain it.
    pub fn query_range(&self, range: Range<usize>) -> impl Iterator<Item = &Span<T>> + '_ {
        let end = range.end;
        self.spans
            .iter()
            .take_while(move |s| s.from <= end)
            .filter(move |s| overlaps(s.from, s.to, &range))
    }

    /// The first span starting strictly after `pos`.
    pub fn first_after(&self, pos: usize) -> Option<&Span<T>> {
        let idx = self.spans.partition_point(|s| s.from <= pos);
        self.spans.get(idx)
    }

    /// The last span (in document order) ending at or before `pos`.
    pub fn last_before(&self, pos: usize) -> Option<&Span<T>> {
        self.spans.iter().rev().find(|s| s.to <= pos)
    }

    pub fn first(&self) -> Option<&Span<T>> {
        self.spans.first()
    }

    pub fn last(&self) -> Option<&Span<T>> {
        self.spans.last()
    }

    pub fn find(&self, mut pred: impl FnMut(&Span<T>) -> bool) -> Option<&Span<T>> {
        self.spans.iter().find(|s| pred(s))
    }

    /// Move every span through `changes`.
    ///
    /// Insertions at a span's `from` push it right, insertions at its `to`
    /// leave it alone. A span overlapping a deletion is clipped to what
    /// survives and dropped if nothing does. Text replaced inside a span,
    /// edges included, stays inside it, so a replacement of exactly the
    /// span's text retargets it onto the inserted text. Zero-width spans
    /// stick to the character in front of them. On error the collection is
    /// left untouched.
    pub fn remap(&mut self, changes: &ChangeSet) -> Result<(), RemapError> {
        if changes.is_empty() && changes.len_before() >= self.max_to() {
            return Ok(());
        }
        let len = changes.len_before();
        if let Some(stale) = self.spans.iter().find(|s| s.to > len) {
            return Err(RemapError::StaleSpan {
                from: stale.from,
                to: stale.to,
                len,
            });
        }
        let spans = std::mem::take(&mut self.spans);
        let mut mapped = Vec::with_capacity(spans.len());
        for mut span in spans {
            if changes.consumes(span.from, span.to) {
                continue;
            }
            if span.is_point() {
                let at = changes.map_pos(span.from, Assoc::After);
                span.from = at;
                span.to = at;
                mapped.push(span);
                continue;
            }
            let (mut from_assoc, mut to_assoc) = (Assoc::After, Assoc::Before);
            for edit in changes.edits() {
                let replaced_inside = edit.from < edit.to
                    && edit.inserted > 0
                    && span.from <= edit.from
                    && edit.to <= span.to;
                if !replaced_inside {
                    continue;
                }
                if edit.from == span.from {
                    from_assoc = Assoc::Before;
                }
                if edit.to == span.to {
                    to_assoc = Assoc::After;
                }
            }
            let from = changes.map_pos(span.from, from_assoc);
            let to = changes.map_pos(span.to, to_assoc);
            if from >= to {
                continue;
            }
            span.from = from;
            span.to = to;
            mapped.push(span);
        }
        mapped.sort_by_key(|s| s.from);
        self.spans = mapped;
        Ok(())
    }

    fn max_to(&self) -> usize {
        self.spans.iter().map(|s| s.to).max().unwrap_or(0)
    }
}

impl<'a, T> IntoIterator for &'a RangeCollection<T> {
    type Item = &'a Span<T>;
    type IntoIter = std::slice::Iter<'a, Span<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

fn overlaps(from: usize, to: usize, range: &Range<usize>) -> bool {
    if range.is_empty() {
        from < range.start && range.start < to
    } else {
        from < range.end && range.start < to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Edit;

    fn coll(spans: &[(usize, usize)]) -> RangeCollection<usize> {
        RangeCollection::from_spans(
            spans
                .iter()
                .enumerate()
                .map(|(i, &(f, t))| Span::new(f, t, i))
                .collect(),
        )
    }

    fn ranges(c: &RangeCollection<usize>) -> Vec<(usize, usize)> {
        c.iter().map(|s| (s.from, s.to)).collect()
    }

    fn changes(len: usize, edits: &[(usize, usize, usize)]) -> ChangeSet {
        ChangeSet::new(
            len,
            edits.iter().map(|&(f, t, n)| Edit::new(f, t, n)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn add_keeps_existing_first_on_ties() {
        let mut c = coll(&[(5, 9), (1, 2)]);
        c.add(vec![Span::new(5, 6, 10), Span::new(0, 1, 11), Span::new(7, 8, 12)]);
        let payloads: Vec<usize> = c.iter().map(|s| s.value).collect();
        assert_eq!(payloads, vec![11, 1, 0, 10, 12]);
    }

    #[test]
    fn query_point_includes_both_edges() {
        let c = coll(&[(0, 3), (3, 6), (8, 9)]);
        let hits: Vec<_> = c.query_point(3).map(|s| s.value).collect();
        assert_eq!(hits, vec![0, 1]);
        assert_eq!(c.query_point(7).count(), 0);
    }

    #[test]
    fn query_range_overlap_rules() {
        let c = coll(&[(0, 3), (3, 6), (4, 5), (8, 9)]);
        let hits: Vec<_> = c.query_range(2..5).map(|s| s.value).collect();
        assert_eq!(hits, vec![0, 1, 2]);
        // an empty range only meets spans strictly containing it
        let hits: Vec<_> = c.query_range(3..3).map(|s| s.value).collect();
        assert!(hits.is_empty());
        let hits: Vec<_> = c.query_range(5..5).map(|s| s.value).collect();
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn navigation_helpers() {
        let c = coll(&[(2, 4), (10, 12), (20, 25)]);
        assert_eq!(c.first_after(2).map(|s| s.from), Some(10));
        assert_eq!(c.first_after(25), None);
        assert_eq!(c.last_before(12).map(|s| s.from), Some(10));
        assert_eq!(c.last_before(11).map(|s| s.from), Some(2));
        assert_eq!(c.last_before(3), None);
    }

    #[test]
    fn remove_overlapping_clears_range() {
        let mut c = coll(&[(0, 3), (3, 6), (8, 9)]);
        assert_eq!(c.remove_overlapping(2..4), 2);
        assert_eq!(ranges(&c), vec![(8, 9)]);
    }

    #[test]
    fn insertion_shifts_from_side_only() {
        let mut c = coll(&[(0, 4), (4, 8), (10, 12)]);
        c.remap(&changes(12, &[(4, 4, 3)])).unwrap();
        assert_eq!(ranges(&c), vec![(0, 4), (7, 11), (13, 15)]);
    }

    #[test]
    fn deletion_clips_and_drops() {
        let mut c = coll(&[(0, 5), (5, 7), (6, 10), (12, 14)]);
        c.remap(&changes(14, &[(4, 8, 0)])).unwrap();
        // (5, 7) is consumed; the others keep what survives
        assert_eq!(ranges(&c), vec![(0, 4), (4, 6), (8, 10)]);
    }

    #[test]
    fn exact_replacement_retargets() {
        let mut c = coll(&[(6, 7)]);
        c.remap(&changes(7, &[(6, 7, 6)])).unwrap();
        assert_eq!(ranges(&c), vec![(6, 12)]);

        let mut c = coll(&[(6, 7)]);
        c.remap(&changes(7, &[(6, 7, 0)])).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn enclosing_span_keeps_covering_a_replaced_tail() {
        // `f x = ?` with a span over the whole definition, `?` padded to a hole
        let mut c = coll(&[(0, 7), (6, 7)]);
        c.remap(&changes(7, &[(6, 7, 6)])).unwrap();
        assert_eq!(ranges(&c), vec![(0, 12), (6, 12)]);

        // replacing the head behaves the same way
        let mut c = coll(&[(0, 7)]);
        c.remap(&changes(7, &[(0, 1, 3)])).unwrap();
        assert_eq!(ranges(&c), vec![(0, 9)]);

        // a pure deletion at the tail still clips
        let mut c = coll(&[(0, 7)]);
        c.remap(&changes(7, &[(6, 7, 0)])).unwrap();
        assert_eq!(ranges(&c), vec![(0, 6)]);
    }

    #[test]
    fn points_follow_the_character_before_them() {
        let mut c = coll(&[(4, 4), (8, 8)]);
        c.remap(&changes(10, &[(4, 4, 2), (6, 8, 0)])).unwrap();
        // the insertion at 4 carries the first point, the deletion of the
        // character before 8 drops the second
        assert_eq!(ranges(&c), vec![(6, 6)]);
    }

    #[test]
    fn adjacent_deletions_collapse_span() {
        let mut c = coll(&[(4, 8)]);
        c.remap(&changes(10, &[(4, 6, 0), (6, 8, 0)])).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn stale_span_leaves_collection_untouched() {
        let mut c = coll(&[(0, 2), (8, 12)]);
        let err = c.remap(&changes(10, &[(0, 1, 0)])).unwrap_err();
        assert_eq!(err, RemapError::StaleSpan { from: 8, to: 12, len: 10 });
        assert_eq!(ranges(&c), vec![(0, 2), (8, 12)]);
    }

    #[test]
    fn empty_collection_remaps_to_itself() {
        let mut c: RangeCollection<usize> = RangeCollection::new();
        c.remap(&changes(3, &[(0, 3, 9)])).unwrap();
        assert!(c.is_empty());
    }
}
