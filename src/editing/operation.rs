//! Edit operations and results

use crate::document::{StyleAttributes, StyleChange};
use std::ops::Range;

/// An atomic edit operation, in character offsets
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    /// Insert text at a position, optionally with explicit (typing) attributes
    Insert {
        position: usize,
        text: String,
        attributes: Option<StyleAttributes>,
    },
    /// Delete text in a range
    Delete { range: Range<usize> },
    /// Replace a range with new text
    Replace {
        range: Range<usize>,
        text: String,
        attributes: Option<StyleAttributes>,
    },
    /// Change formatting over a range without touching the text
    Format {
        range: Range<usize>,
        change: StyleChange,
    },
    /// A composite transaction of multiple operations, applied in order
    Transaction { ops: Vec<EditOp> },
}

impl EditOp {
    /// Create an insert operation inheriting neighbouring attributes
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Self::Insert {
            position,
            text: text.into(),
            attributes: None,
        }
    }

    /// Create an insert operation with explicit attributes
    pub fn insert_styled(
        position: usize,
        text: impl Into<String>,
        attributes: StyleAttributes,
    ) -> Self {
        Self::Insert {
            position,
            text: text.into(),
            attributes: Some(attributes),
        }
    }

    /// Create a delete operation
    pub fn delete(start: usize, end: usize) -> Self {
        Self::Delete { range: start..end }
    }

    /// Create a replace operation
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self::Replace {
            range,
            text: text.into(),
            attributes: None,
        }
    }

    /// Create a formatting operation
    pub fn format(range: Range<usize>, change: StyleChange) -> Self {
        Self::Format { range, change }
    }

    /// Create a transaction
    pub fn transaction(ops: Vec<EditOp>) -> Self {
        Self::Transaction { ops }
    }

    /// Range touched by this operation, in pre-edit coordinates
    pub fn affected_range(&self) -> Range<usize> {
        match self {
            EditOp::Insert { position, .. } => *position..*position,
            EditOp::Delete { range } | EditOp::Replace { range, .. } | EditOp::Format { range, .. } => {
                range.clone()
            }
            EditOp::Transaction { ops } => {
                let mut min_start = usize::MAX;
                let mut max_end = 0;
                for op in ops {
                    let range = op.affected_range();
                    min_start = min_start.min(range.start);
                    max_end = max_end.max(range.end);
                }
                if min_start == usize::MAX {
                    0..0
                } else {
                    min_start..max_end
                }
            }
        }
    }
}

/// What an edit changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditKind {
    /// Text was inserted, removed or replaced
    #[default]
    Text,
    /// Only attributes changed
    Format,
}

/// Result of applying an edit operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditResult {
    /// New document version after this edit
    pub version: u64,
    pub kind: EditKind,
    /// First changed character
    pub start: usize,
    /// End of the changed region before the edit
    pub old_end: usize,
    /// End of the changed region after the edit
    pub new_end: usize,
    /// Cursor position after the edit
    pub new_cursor: usize,
}

impl EditResult {
    /// Change in document length
    pub fn delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }

    /// Check if anything changed
    pub fn has_changes(&self) -> bool {
        self.old_end > self.start || self.new_end > self.start
    }

    /// Changed region in post-edit coordinates
    pub fn changed_range(&self) -> Range<usize> {
        self.start..self.new_end
    }

    /// Map a pre-edit offset at or after `old_end` into post-edit coordinates
    pub fn map_offset(&self, offset: usize) -> Option<usize> {
        if offset <= self.start {
            Some(offset)
        } else if offset >= self.old_end {
            Some((offset as isize + self.delta()) as usize)
        } else {
            None
        }
    }

    /// Fold a later edit into this one, keeping a region that covers both
    pub(crate) fn merge(self, later: EditResult) -> EditResult {
        let start = self.start.min(later.start);
        // `later` is in coordinates produced by `self`; map its old end back.
        let later_old_end_in_original = if later.old_end >= self.new_end {
            (later.old_end as isize - self.delta()) as usize
        } else if later.old_end <= self.start {
            later.old_end
        } else {
            self.old_end
        };
        let old_end = self.old_end.max(later_old_end_in_original);
        let new_end = (old_end as isize + self.delta() + later.delta()) as usize;
        EditResult {
            version: later.version,
            kind: if self.kind == EditKind::Format && later.kind == EditKind::Format {
                EditKind::Format
            } else {
                EditKind::Text
            },
            start,
            old_end,
            new_end: new_end.max(later.new_end),
            new_cursor: later.new_cursor,
        }
    }
}
