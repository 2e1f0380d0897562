//! Edit descriptors.
//!
//! A [`Change`] is what a caller asks the buffer to do; a [`ChangeSet`] is what
//! the buffer reports back once the changes were committed. The change set is
//! expressed entirely in pre-edit code units so stored spans can be remapped
//! without looking at the text again.

use crate::TextError;

/// A single replacement request: `[from, to)` is replaced by `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl Change {
    pub fn new(from: usize, to: usize, insert: impl Into<String>) -> Self {
        Self {
            from,
            to,
            insert: insert.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at, at, text)
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self::new(from, to, String::new())
    }
}

/// One committed replacement, `inserted` measured in code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub from: usize,
    pub to: usize,
    pub inserted: usize,
}

impl Edit {
    pub fn new(from: usize, to: usize, inserted: usize) -> Self {
        Self { from, to, inserted }
    }

    fn delta(&self) -> isize {
        self.inserted as isize - (self.to - self.from) as isize
    }
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    /// Stay in front of text inserted at the position.
    Before,
    /// Move past text inserted at the position.
    After,
}

/// Sorted, non-overlapping edits in pre-edit coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    len_before: usize,
    edits: Vec<Edit>,
}

impl ChangeSet {
    /// Build a change set, rejecting edits that are inverted, unsorted,
    /// overlapping or reach past `len_before`.
    pub fn new(len_before: usize, edits: Vec<Edit>) -> Result<Self, TextError> {
        let mut floor = 0usize;
        for (index, edit) in edits.iter().enumerate() {
            if edit.from < floor || edit.from > edit.to || edit.to > len_before {
                return Err(TextError::MalformedChangeSet {
                    index,
                    len: len_before,
                });
            }
            floor = edit.to;
        }
        Ok(Self { len_before, edits })
    }

    /// The identity change set for a buffer of `len` code units.
    pub fn empty(len: usize) -> Self {
        Self {
            len_before: len,
            edits: Vec::new(),
        }
    }

    pub(crate) fn from_validated(len_before: usize, edits: Vec<Edit>) -> Self {
        Self { len_before, edits }
    }

    pub fn len_before(&self) -> usize {
        self.len_before
    }

    pub fn len_after(&self) -> usize {
        let delta: isize = self.edits.iter().map(Edit::delta).sum();
        self.len_before.saturating_add_signed(delta)
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Map a pre-edit position into the post-edit buffer.
    ///
    /// A position inside a replaced region collapses to the start of the
    /// replacement (`Before`) or to its end (`After`).
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let mut delta = 0isize;
        for edit in &self.edits {
            match assoc {
                Assoc::After => {
                    if pos < edit.from {
                        break;
                    }
                    if pos < edit.to {
                        return (edit.from + edit.inserted).saturating_add_signed(delta);
                    }
                }
                Assoc::Before => {
                    if pos <= edit.from {
                        break;
                    }
                    if pos <= edit.to {
                        return edit.from.saturating_add_signed(delta);
                    }
                }
            }
            delta += edit.delta();
        }
        pos.saturating_add_signed(delta)
    }

    /// True when the span `[from, to)` does not survive the edits.
    ///
    /// Non-empty spans are consumed when a deletion covers them, unless the
    /// deleted region is exactly the span and something is inserted in its
    /// place. Zero-width spans track the character in front of them and are
    /// consumed when that character is deleted.
    pub fn consumes(&self, from: usize, to: usize) -> bool {
        self.edits.iter().any(|edit| {
            if from == to {
                edit.from < from && from <= edit.to
            } else {
                let covered = edit.from <= from && to <= edit.to;
                let retargeted = edit.from == from && edit.to == to && edit.inserted > 0;
                covered && !retargeted
            }
        })
    }
}
