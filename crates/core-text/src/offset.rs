//! Translation between prover codepoint offsets and buffer code units.
//!
//! The two coordinate systems agree until the first astral character; every
//! astral character inflates all later code-unit offsets by one. The forward
//! direction ([`codepoint_ranges_to_units`]) runs once per highlight response
//! over potentially thousands of ranges, so it is a single streaming pass over
//! the buffer's chunks. The reverse direction ([`to_external`]) is needed only
//! a handful of times per outbound command and simply counts astral characters
//! in the text preceding the position.

use crate::{Buffer, OffsetError, TextError, is_astral};
use std::ops::Range;
use std::time::Instant;

/// A position in the prover's coordinate space.
///
/// `offset` and `column` are 0-indexed codepoint counts, `line` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalPos {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ExternalPos {
    /// The `(offset, line, column)` tuple as the prover expects it: all 1-indexed.
    pub fn wire(&self) -> (usize, usize, usize) {
        (self.offset + 1, self.line, self.column + 1)
    }
}

/// A range that started in an earlier chunk and is still waiting for the
/// chunk that contains its end.
struct Continuation {
    index: usize,
    start: usize,
    pending_end: usize,
}

/// Reject inverted, unsorted or partially overlapping input. Nesting is
/// allowed; on equal starts the enclosing range must come first.
fn validate(ranges: &[Range<usize>]) -> Result<(), OffsetError> {
    let mut open: Vec<usize> = Vec::new();
    let mut last_start = 0usize;
    for (index, range) in ranges.iter().enumerate() {
        if range.start > range.end {
            return Err(OffsetError::Inverted { index });
        }
        if range.start < last_start {
            return Err(OffsetError::Unsorted { index });
        }
        last_start = range.start;
        while open.last().is_some_and(|&end| end <= range.start) {
            open.pop();
        }
        if open.last().is_some_and(|&end| range.end > end) {
            return Err(OffsetError::PartialOverlap { index });
        }
        open.push(range.end);
    }
    Ok(())
}

/// Map codepoint ranges to code-unit ranges in one pass over `chunks`.
///
/// `ranges` must be sorted by start and must not partially overlap; the
/// result has one entry per input range, in input order.
pub fn codepoint_ranges_to_units<'a, I>(
    chunks: I,
    ranges: &[Range<usize>],
) -> Result<Vec<Range<usize>>, OffsetError>
where
    I: IntoIterator<Item = &'a str>,
{
    if ranges.is_empty() {
        return Ok(Vec::new());
    }
    validate(ranges)?;
    let started = Instant::now();

    let mut out: Vec<Option<Range<usize>>> = Vec::with_capacity(ranges.len());
    let mut stack: Vec<Continuation> = Vec::new();
    // astral characters and codepoints in the chunks fully scanned so far
    let mut astral_count = 0usize;
    let mut scanned = 0usize;
    let mut next = 0usize;
    let mut astral: Vec<usize> = Vec::new();

    for chunk in chunks {
        astral.clear();
        let mut chars = 0usize;
        for c in chunk.chars() {
            if is_astral(c) {
                astral.push(scanned + chars);
            }
            chars += 1;
        }
        let chunk_end = scanned + chars;

        // Close the ranges this chunk steps out of. Nesting keeps the
        // innermost (smallest end) on top.
        while let Some(top) = stack.last() {
            if top.pending_end > chunk_end {
                break;
            }
            let end_offs = astral.partition_point(|&p| p < top.pending_end);
            out[top.index] = Some(top.start..top.pending_end + astral_count + end_offs);
            stack.pop();
        }

        while let Some(range) = ranges.get(next) {
            if chunk_end <= range.start {
                break;
            }
            let start_offs = astral.partition_point(|&p| p < range.start);
            let start = range.start + astral_count + start_offs;
            if range.end <= chunk_end {
                let end_offs = astral.partition_point(|&p| p < range.end);
                out.push(Some(start..range.end + astral_count + end_offs));
            } else {
                stack.push(Continuation {
                    index: out.len(),
                    start,
                    pending_end: range.end,
                });
                out.push(None);
            }
            next += 1;
        }

        astral_count += astral.len();
        scanned = chunk_end;
    }

    if let Some(top) = stack.last() {
        return Err(OffsetError::PastEnd {
            end: top.pending_end,
            len: scanned,
        });
    }
    // Ranges starting exactly at the end of the text never meet a chunk that
    // extends past their start.
    for range in &ranges[next..] {
        if range.end > scanned {
            return Err(OffsetError::PastEnd {
                end: range.end,
                len: scanned,
            });
        }
        out.push(Some(range.start + astral_count..range.end + astral_count));
    }

    tracing::debug!(
        target: "text.offset",
        ranges = ranges.len(),
        astral = astral_count,
        elapsed_us = started.elapsed().as_micros() as u64,
        "codepoint_ranges_to_units"
    );
    Ok(out.into_iter().flatten().collect())
}

/// Map a single codepoint offset to a code-unit offset.
pub fn codepoint_to_unit<'a, I>(chunks: I, offset: usize) -> Result<usize, OffsetError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mapped = codepoint_ranges_to_units(chunks, std::slice::from_ref(&(offset..offset)))?;
    Ok(mapped.first().map_or(offset, |r| r.start))
}

/// Convert a buffer position into the prover's `(offset, line, column)`.
pub fn to_external(buffer: &Buffer, pos: usize) -> Result<ExternalPos, TextError> {
    let line = buffer.line_at(pos)?;
    let above = buffer.astral_between(0, line.from)?;
    let ahead = buffer.astral_between(line.from, pos)?;
    Ok(ExternalPos {
        offset: pos - above - ahead,
        line: line.number,
        column: pos - line.from - ahead,
    })
}
