//! Cursor and selection in character offsets

use std::ops::Range;

/// Cursor affinity for ambiguous positions
///
/// A caret sitting exactly on a page boundary is drawn at the end of the previous page
/// when upstream, and at the top of the next page when downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    /// Prefer end of previous line
    Upstream,
    /// Prefer start of next line
    #[default]
    Downstream,
}

/// Text selection (anchor + active point)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// The anchor point (fixed during extension)
    pub anchor: usize,
    /// The active point (moves during extension)
    pub active: usize,
    pub affinity: Affinity,
}

impl Selection {
    /// Create a new selection
    pub fn new(anchor: usize, active: usize) -> Self {
        Self {
            anchor,
            active,
            affinity: Affinity::Downstream,
        }
    }

    /// Create a collapsed selection (cursor)
    pub fn collapsed(position: usize) -> Self {
        Self::new(position, position)
    }

    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.affinity = affinity;
        self
    }

    /// Check if selection is collapsed (no text selected)
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.active
    }

    /// Selected range, start <= end
    pub fn range(&self) -> Range<usize> {
        self.anchor.min(self.active)..self.anchor.max(self.active)
    }

    /// Extend selection to a new active position
    pub fn extend_to(&mut self, position: usize) {
        self.active = position;
    }

    /// Check if an offset is within the selection
    pub fn contains(&self, offset: usize) -> bool {
        self.range().contains(&offset)
    }

    /// Clamp both ends to a document of `len` characters
    pub fn clamped(self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            active: self.active.min(len),
            affinity: self.affinity,
        }
    }
}
