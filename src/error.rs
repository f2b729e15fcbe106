//! Error types for the layout core.
//!
//! Pagination and rendering never surface these to callers; they degrade and log.
//! Errors are returned only where the caller can act on them: edits, codecs, settings.

use std::ops::Range;
use thiserror::Error;

/// Error applying an edit to a styled document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// Position or range extends past the end of the document.
    #[error("range {start}..{end} is out of bounds (document length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// A range whose start is after its end.
    #[error("inverted range {start}..{end}")]
    InvertedRange { start: usize, end: usize },

    /// Runs do not cover the text exactly or overlap.
    #[error("invalid runs: {0}")]
    InvalidRuns(String),
}

impl EditError {
    pub(crate) fn out_of_bounds(range: &Range<usize>, len: usize) -> Self {
        EditError::OutOfBounds {
            start: range.start,
            end: range.end,
            len,
        }
    }
}

/// Error from a text layout engine pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Container has a non-positive or non-finite width.
    #[error("invalid container {width}x{height}")]
    InvalidContainer { width: f32, height: f32 },

    /// Layout was requested past the end of the text.
    #[error("offset {offset} is past the end of the document (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// Font metrics produced a non-finite measurement.
    #[error("font '{family}' produced non-finite metrics")]
    NonFiniteMetrics { family: String },
}

/// Error decoding or encoding persisted rich text.
#[derive(Error, Debug)]
pub enum CodecError {
    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded snapshot is not a valid document.
    #[error("invalid document snapshot: {0}")]
    InvalidSnapshot(#[from] EditError),

    /// Host codec failure.
    #[error("{0}")]
    Other(String),
}

/// Error loading editor settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings document could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
