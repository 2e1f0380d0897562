//! Jumping between holes.

use core_syntax::{HoleId, RangeCollection, Span};
use core_text::Buffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Where a jump lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub hole: Span<HoleId>,
    /// The search ran off one end of the buffer and restarted at the other.
    pub wrapped: bool,
}

/// The hole to jump to from `pos`.
///
/// `Next` picks the first hole starting after `pos`; `Prev` picks the last
/// hole ending at or before it. With `wrap`, running off the end continues
/// from the other side.
pub fn destination(
    holes: &RangeCollection<HoleId>,
    pos: usize,
    direction: Direction,
    wrap: bool,
) -> Option<Destination> {
    let (found, fallback) = match direction {
        Direction::Next => (holes.first_after(pos), holes.first()),
        Direction::Prev => (holes.last_before(pos), holes.last()),
    };
    if let Some(hole) = found {
        return Some(Destination {
            hole: *hole,
            wrapped: false,
        });
    }
    if !wrap {
        return None;
    }
    fallback.map(|hole| Destination {
        hole: *hole,
        wrapped: true,
    })
}

/// Cursor position `offset` units into `hole`, kept inside the hole and off
/// the second half of a surrogate pair.
pub fn landing(buffer: &Buffer, hole: &Span<HoleId>, offset: usize) -> usize {
    let target = hole.from.saturating_add(offset).min(hole.to);
    if target < hole.to && buffer.line_at(target).is_err() {
        target + 1
    } else {
        target
    }
}
