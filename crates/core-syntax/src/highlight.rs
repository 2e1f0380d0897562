//! Turning a prover highlight response into buffer-coordinate spans.

use crate::hole::{HOLE_TAG, is_hole};
use crate::{Span, SyntaxError};
use core_text::{Buffer, OffsetError, codepoint_ranges_to_units};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Where a highlighted name is defined: a module and a codepoint position in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionSite {
    pub module: String,
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightMeta {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub definition: Option<DefinitionSite>,
}

/// One span as the prover sends it: 1-indexed codepoint offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSpan {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meta: Option<HighlightMeta>,
}

/// Payload of a highlight span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    /// Token-type tags in announcement order, without duplicates.
    pub tags: Vec<String>,
    /// The buffer text the span covered when the batch was built.
    pub text: String,
    pub meta: Option<HighlightMeta>,
}

impl HighlightSpan {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A hole found in a batch, before it is given an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleCandidate {
    pub from: usize,
    pub to: usize,
    pub text: String,
}

/// A whole highlight response translated into code units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightBatch {
    pub highlights: Vec<Span<HighlightSpan>>,
    pub holes: Vec<HoleCandidate>,
}

impl HighlightBatch {
    /// Translate `raw` against `buffer`.
    ///
    /// Spans are reordered by start (enclosing spans first) before
    /// translation; partially overlapping spans are rejected.
    pub fn build(buffer: &Buffer, raw: &[RawSpan]) -> Result<Self, SyntaxError> {
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let started = Instant::now();
        let mut order: Vec<usize> = (0..raw.len()).collect();
        order.sort_by_key(|&i| (raw[i].start, std::cmp::Reverse(raw[i].end)));

        let mut ranges = Vec::with_capacity(raw.len());
        for &i in &order {
            let span = &raw[i];
            let start = zero_indexed(span.start)?;
            let end = zero_indexed(span.end)?;
            ranges.push(start..end);
        }
        let mapped = codepoint_ranges_to_units(buffer.chunks(), &ranges)?;

        let mut batch = Self {
            highlights: Vec::with_capacity(raw.len()),
            holes: Vec::new(),
        };
        for (&i, range) in order.iter().zip(mapped) {
            let span = &raw[i];
            let text = buffer.slice(range.start, range.end)?;
            let mut tags = dedup_tags(&span.tags);
            if is_hole(&text, &tags) {
                // repeated spans over one hole name it once
                let seen = batch
                    .holes
                    .last()
                    .is_some_and(|h| h.from == range.start && h.to == range.end);
                if !seen {
                    batch.holes.push(HoleCandidate {
                        from: range.start,
                        to: range.end,
                        text: text.clone(),
                    });
                }
                // the hole itself is styled as a hole, not as a symbol
                tags.retain(|t| t != HOLE_TAG);
            }
            batch.highlights.push(Span::new(
                range.start,
                range.end,
                HighlightSpan {
                    tags,
                    text,
                    meta: span.meta.clone(),
                },
            ));
        }
        tracing::debug!(
            target: "syntax.highlight",
            spans = batch.highlights.len(),
            holes = batch.holes.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "built highlight batch"
        );
        Ok(batch)
    }
}

fn zero_indexed(offset: usize) -> Result<usize, OffsetError> {
    offset
        .checked_sub(1)
        .ok_or(OffsetError::ZeroIndexed { offset })
}

fn dedup_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}
