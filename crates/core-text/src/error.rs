use thiserror::Error;

/// Precondition violations raised by [`crate::Buffer`] and [`crate::ChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("position {pos} is out of bounds for a buffer of {len} code units")]
    OutOfBounds { pos: usize, len: usize },
    #[error("position {pos} falls inside a surrogate pair")]
    SplitsSurrogatePair { pos: usize },
    #[error("range {from}..{to} ends before it starts")]
    InvertedRange { from: usize, to: usize },
    #[error("edit #{index} is unsorted, overlapping or outside the {len} code units it applies to")]
    MalformedChangeSet { index: usize, len: usize },
}

/// Precondition violations of the batched codepoint translator.
///
/// Every variant means the caller handed over ranges the streaming pass cannot
/// map faithfully; nothing is ever partially mapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffsetError {
    #[error("range #{index} ends before it starts")]
    Inverted { index: usize },
    #[error("range #{index} starts before its predecessor")]
    Unsorted { index: usize },
    #[error("range #{index} partially overlaps an enclosing range")]
    PartialOverlap { index: usize },
    #[error("range ending at {end} lies past the end of the buffer ({len} codepoints)")]
    PastEnd { end: usize, len: usize },
    #[error("codepoint offset {offset} is not 1-indexed")]
    ZeroIndexed { offset: usize },
}
