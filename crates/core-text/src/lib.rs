//! Rope-backed text buffer addressed in UTF-16 code units.
//!
//! Every public position on [`Buffer`] is a code-unit offset, the native
//! indexing of the host editor: a character outside the basic multilingual
//! plane occupies two consecutive units. The prover speaks codepoints instead;
//! the conversion between the two lives in [`offset`].
//!
//! Mutation goes through [`Buffer::apply`], which commits a batch of
//! [`Change`]s atomically and reports a [`ChangeSet`] that stored spans are
//! remapped with.

use ropey::Rope;
use std::fmt;

mod change;
mod error;
pub mod offset;

pub use change::{Assoc, Change, ChangeSet, Edit};
pub use error::{OffsetError, TextError};
pub use offset::{ExternalPos, codepoint_ranges_to_units, codepoint_to_unit, to_external};

/// A physical line: `[from, to)` excludes the line break, `number` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub from: usize,
    pub to: usize,
    pub number: usize,
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

/// True for characters encoded as a surrogate pair in UTF-16.
#[inline]
pub fn is_astral(c: char) -> bool {
    c.len_utf16() == 2
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            name: name.into(),
        }
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Length in codepoints (the prover's unit).
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Lazily iterate the text in the rope's own chunks; chunks never split a character.
    pub fn chunks(&self) -> impl Iterator<Item = &str> + '_ {
        self.rope.chunks()
    }

    /// Resolve a code-unit position to a char index, rejecting positions past
    /// the end and positions between the two halves of a surrogate pair.
    fn char_index(&self, pos: usize) -> Result<usize, TextError> {
        let len = self.len();
        if pos > len {
            return Err(TextError::OutOfBounds { pos, len });
        }
        let idx = self.rope.utf16_cu_to_char(pos);
        if self.rope.char_to_utf16_cu(idx) != pos {
            return Err(TextError::SplitsSurrogatePair { pos });
        }
        Ok(idx)
    }

    fn char_range(&self, from: usize, to: usize) -> Result<(usize, usize), TextError> {
        if from > to {
            return Err(TextError::InvertedRange { from, to });
        }
        Ok((self.char_index(from)?, self.char_index(to)?))
    }

    /// Owned copy of the text in `[from, to)`.
    pub fn slice(&self, from: usize, to: usize) -> Result<String, TextError> {
        let (start, end) = self.char_range(from, to)?;
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Number of astral characters in `[from, to)`.
    pub fn astral_between(&self, from: usize, to: usize) -> Result<usize, TextError> {
        let (start, end) = self.char_range(from, to)?;
        Ok(self
            .rope
            .slice(start..end)
            .chars()
            .filter(|c| is_astral(*c))
            .count())
    }

    /// The physical line containing `pos`. A position sitting right after a
    /// line break belongs to the following line.
    pub fn line_at(&self, pos: usize) -> Result<Line, TextError> {
        let idx = self.char_index(pos)?;
        let line_idx = self.rope.char_to_line(idx);
        let start = self.rope.line_to_char(line_idx);
        let line = self.rope.line(line_idx);
        let mut len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len -= 1;
        }
        if len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
        Ok(Line {
            from: self.rope.char_to_utf16_cu(start),
            to: self.rope.char_to_utf16_cu(start + len),
            number: line_idx + 1,
        })
    }

    /// Commit `changes` as one transaction and describe what happened.
    ///
    /// Changes are given in pre-edit coordinates, sorted and non-overlapping.
    /// Validation happens before any mutation, so a rejected batch leaves the
    /// buffer untouched.
    pub fn apply(&mut self, changes: &[Change]) -> Result<ChangeSet, TextError> {
        let len_before = self.len();
        let mut floor = 0usize;
        let mut resolved = Vec::with_capacity(changes.len());
        let mut edits = Vec::with_capacity(changes.len());
        for (index, change) in changes.iter().enumerate() {
            if change.from < floor || change.from > change.to || change.to > len_before {
                return Err(TextError::MalformedChangeSet {
                    index,
                    len: len_before,
                });
            }
            floor = change.to;
            resolved.push(self.char_range(change.from, change.to)?);
            edits.push(Edit::new(
                change.from,
                change.to,
                change.insert.encode_utf16().count(),
            ));
        }
        for (change, (start, end)) in changes.iter().zip(resolved).rev() {
            if start < end {
                self.rope.remove(start..end);
            }
            if !change.insert.is_empty() {
                self.rope.insert(start, &change.insert);
            }
        }
        let set = ChangeSet::from_validated(len_before, edits);
        tracing::trace!(
            target: "text.buffer",
            changes = changes.len(),
            len_before,
            len_after = set.len_after(),
            "apply"
        );
        debug_assert_eq!(set.len_after(), self.len());
        Ok(set)
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
