//! Styled document model with rope-based storage

mod codec;
mod outline;
mod rope;
mod runs;
mod style;

pub use codec::{DocumentSnapshot, JsonCodec, RichTextCodec};
pub use outline::{
    build_tree, current_heading, extract_outline, HeadingClassifier, OutlineEntry, OutlineNode,
};
pub use rope::Rope;
pub use runs::{RunList, StyledRun};
pub use style::{
    Alignment, FontDescriptor, ParagraphStyle, StyleAttributes, StyleChange, DEFAULT_FONT_FAMILY,
    DEFAULT_FONT_SIZE,
};

use crate::config::BodyStyle;
use crate::editing::{EditKind, EditOp, EditResult};
use crate::error::EditError;
use log::warn;
use std::ops::Range;

/// Text plus attribute runs
///
/// Offsets are character offsets (Unicode scalar values). The run list always covers
/// `[0, len)` exactly.
#[derive(Debug, Clone, Default)]
pub struct StyledDocument {
    /// Rope storing the full text content
    content: Rope,
    runs: RunList,
    /// Typing attributes for plain text and for an empty document
    defaults: StyleAttributes,
    /// Monotonic version counter
    version: u64,
}

impl PartialEq for StyledDocument {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.runs == other.runs
            && self.defaults == other.defaults
            && self.text() == other.text()
    }
}

impl StyledDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from plain text carrying one set of attributes
    pub fn from_plain_text(text: &str, attributes: StyleAttributes) -> Self {
        let content = Rope::from_str(text);
        let runs = RunList::covering(content.len(), attributes.clone());
        Self {
            content,
            runs,
            defaults: attributes,
            version: 0,
        }
    }

    /// Create a document from text and caller-supplied runs
    pub fn from_runs(text: &str, runs: Vec<StyledRun>) -> Result<Self, EditError> {
        let content = Rope::from_str(text);
        let defaults = runs
            .first()
            .map(|run| run.attributes.clone())
            .unwrap_or_default();
        let runs = RunList::from_runs(runs, content.len())?;
        Ok(Self {
            content,
            runs,
            defaults,
            version: 0,
        })
    }

    /// Load persisted content: the rich blob first, then the plain fallback, then empty
    pub fn load(
        rich: Option<&[u8]>,
        plain: Option<&str>,
        codec: &dyn RichTextCodec,
        defaults: StyleAttributes,
    ) -> Self {
        if let Some(blob) = rich {
            match codec.decode(blob) {
                Ok(doc) => return doc,
                Err(err) => warn!("could not decode rich text, falling back to plain text: {}", err),
            }
        }
        match plain {
            Some(text) => Self::from_plain_text(text, defaults),
            None => Self::new().with_defaults(defaults),
        }
    }

    /// Replace the typing attributes
    pub fn with_defaults(mut self, defaults: StyleAttributes) -> Self {
        self.defaults = defaults;
        self
    }

    /// Get the document version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get total length in characters
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Check if document is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Get the full document text
    pub fn text(&self) -> String {
        self.content.to_string()
    }

    /// Get text range
    pub fn text_range(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.len());
        self.content.slice(range.start.min(end), end)
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.content.char_at(offset)
    }

    pub fn runs(&self) -> &[StyledRun] {
        self.runs.as_slice()
    }

    /// Runs intersecting `range`, unclipped
    pub fn runs_in(&self, range: Range<usize>) -> impl Iterator<Item = &StyledRun> + '_ {
        self.runs.runs_in(range)
    }

    pub fn default_attributes(&self) -> &StyleAttributes {
        &self.defaults
    }

    /// Attributes of the character at `offset`, or the defaults past the end
    pub fn attributes_at(&self, offset: usize) -> &StyleAttributes {
        self.runs.attributes_at(offset).unwrap_or(&self.defaults)
    }

    /// Paragraph settings of the paragraph containing `offset`
    pub fn paragraph_style_at(&self, offset: usize) -> &ParagraphStyle {
        let start = self.paragraph_range(offset).start;
        &self.attributes_at(start).paragraph
    }

    /// Paragraph containing `index`, including its terminating newline
    ///
    /// `index == len` yields the last paragraph that holds a character.
    pub fn paragraph_range(&self, index: usize) -> Range<usize> {
        let len = self.len();
        if len == 0 {
            return 0..0;
        }
        let index = index.min(len - 1);
        let preceding = self.content.lines_before(index);
        let start = match preceding {
            0 => 0,
            n => self.content.nth_newline(n - 1).map_or(0, |nl| nl + 1),
        };
        let end = self
            .content
            .nth_newline(preceding)
            .map_or(len, |nl| nl + 1);
        start..end
    }

    /// All paragraph ranges in order
    pub fn paragraph_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::with_capacity(self.content.line_count() + 1);
        let mut start = 0;
        while start < self.len() {
            let range = self.paragraph_range(start);
            start = range.end;
            ranges.push(range);
        }
        ranges
    }

    /// Slice preserving attributes; offsets are rebased to zero
    pub fn substring(&self, range: Range<usize>) -> StyledDocument {
        let len = self.len();
        debug_assert!(
            range.start <= range.end && range.end <= len,
            "substring {:?} outside document of length {}",
            range,
            len
        );
        let end = range.end.min(len);
        let start = range.start.min(end);
        StyledDocument {
            content: Rope::from_str(&self.content.slice(start, end)),
            runs: self.runs.slice(start..end),
            defaults: self.defaults.clone(),
            version: 0,
        }
    }

    /// Apply an edit operation
    ///
    /// A failing transaction leaves the document untouched.
    pub fn apply_edit(&mut self, op: EditOp) -> Result<EditResult, EditError> {
        let mut result = match op {
            op @ EditOp::Transaction { .. } => {
                let mut staged = self.clone();
                let result = staged.apply_one(op)?;
                self.content = staged.content;
                self.runs = staged.runs;
                result
            }
            op => self.apply_one(op)?,
        };
        self.version += 1;
        result.version = self.version;
        Ok(result)
    }

    fn apply_one(&mut self, op: EditOp) -> Result<EditResult, EditError> {
        match op {
            EditOp::Insert {
                position,
                text,
                attributes,
            } => self.apply_insert(position, &text, attributes),
            EditOp::Delete { range } => self.apply_delete(range),
            EditOp::Replace {
                range,
                text,
                attributes,
            } => self.apply_replace(range, &text, attributes),
            EditOp::Format { range, change } => self.apply_format(range, &change),
            EditOp::Transaction { ops } => {
                let mut merged: Option<EditResult> = None;
                for op in ops {
                    let step = self.apply_one(op)?;
                    merged = Some(match merged {
                        Some(prev) => prev.merge(step),
                        None => step,
                    });
                }
                Ok(merged.unwrap_or_default())
            }
        }
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), EditError> {
        if range.start > range.end {
            return Err(EditError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > self.len() {
            return Err(EditError::out_of_bounds(range, self.len()));
        }
        Ok(())
    }

    /// Attributes new text takes at `position` when none are supplied
    fn inherited_attributes(&self, position: usize) -> StyleAttributes {
        let source = if position > 0 { position - 1 } else { 0 };
        self.runs
            .attributes_at(source)
            .unwrap_or(&self.defaults)
            .clone()
    }

    fn apply_insert(
        &mut self,
        position: usize,
        text: &str,
        attributes: Option<StyleAttributes>,
    ) -> Result<EditResult, EditError> {
        self.check_range(&(position..position))?;
        let count = text.chars().count();
        let attributes = attributes.unwrap_or_else(|| self.inherited_attributes(position));

        self.content.insert(position, text);
        self.runs.insert(position, count, attributes);

        Ok(EditResult {
            version: self.version,
            kind: EditKind::Text,
            start: position,
            old_end: position,
            new_end: position + count,
            new_cursor: position + count,
        })
    }

    fn apply_delete(&mut self, range: Range<usize>) -> Result<EditResult, EditError> {
        self.check_range(&range)?;
        self.content.delete(range.start, range.end);
        self.runs.delete(range.clone());

        Ok(EditResult {
            version: self.version,
            kind: EditKind::Text,
            start: range.start,
            old_end: range.end,
            new_end: range.start,
            new_cursor: range.start,
        })
    }

    fn apply_replace(
        &mut self,
        range: Range<usize>,
        text: &str,
        attributes: Option<StyleAttributes>,
    ) -> Result<EditResult, EditError> {
        self.check_range(&range)?;
        // Replacement text takes the style of what it replaces
        let attributes = attributes.unwrap_or_else(|| {
            if range.is_empty() {
                self.inherited_attributes(range.start)
            } else {
                self.attributes_at(range.start).clone()
            }
        });
        let count = text.chars().count();

        self.content.delete(range.start, range.end);
        self.runs.delete(range.clone());
        self.content.insert(range.start, text);
        self.runs.insert(range.start, count, attributes);

        Ok(EditResult {
            version: self.version,
            kind: EditKind::Text,
            start: range.start,
            old_end: range.end,
            new_end: range.start + count,
            new_cursor: range.start + count,
        })
    }

    fn apply_format(
        &mut self,
        range: Range<usize>,
        change: &StyleChange,
    ) -> Result<EditResult, EditError> {
        self.check_range(&range)?;
        let mut touched = range.clone();

        if change.touches_font() {
            self.runs
                .apply(range.clone(), |attrs| change.apply_font(&mut attrs.font));
        }
        if change.touches_paragraph() && !self.is_empty() {
            let first = self.paragraph_range(range.start);
            let last = if range.is_empty() {
                first.clone()
            } else {
                self.paragraph_range(range.end - 1)
            };
            touched = first.start..last.end;
            self.runs
                .apply(touched.clone(), |attrs| change.apply_paragraph(&mut attrs.paragraph));
        }

        Ok(EditResult {
            version: self.version,
            kind: EditKind::Format,
            start: touched.start,
            old_end: touched.end,
            new_end: touched.end,
            new_cursor: range.end,
        })
    }

    /// Re-apply the body font and paragraph settings to every non-heading paragraph
    ///
    /// Bold and italic survive, as does an explicit non-left alignment. Headings are
    /// classified against the body size in effect before the change.
    pub fn apply_body_style(&mut self, body: &BodyStyle) {
        let classifier = HeadingClassifier::new(self.defaults.font.size);

        for range in self.paragraph_ranges() {
            if classifier.is_heading(self.leading_font(range.clone())) {
                continue;
            }
            self.runs
                .apply(range, |attrs| apply_body_attributes(attrs, body));
        }
        apply_body_attributes(&mut self.defaults, body);
        self.version += 1;
    }

    /// Font of the first non-whitespace character in `range`
    pub(crate) fn leading_font(&self, range: Range<usize>) -> &FontDescriptor {
        let text = self.text_range(range.clone());
        let offset = text
            .chars()
            .position(|c| !c.is_whitespace())
            .unwrap_or(0);
        &self.attributes_at(range.start + offset).font
    }
}

fn apply_body_attributes(attrs: &mut StyleAttributes, body: &BodyStyle) {
    attrs.font.family = body.font_family.clone();
    attrs.font.size = body.font_size;

    let paragraph = &mut attrs.paragraph;
    paragraph.line_height_multiple = body.line_spacing;
    paragraph.spacing_after = body.paragraph_spacing;
    paragraph.spacing_before = body.paragraph_spacing_before;
    paragraph.first_line_indent = body.first_line_indent;
    paragraph.hyphenation = body.hyphenation;
    if paragraph.alignment == Alignment::Left {
        paragraph.alignment = body.alignment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> StyledDocument {
        StyledDocument::from_plain_text(text, StyleAttributes::default())
    }

    #[test]
    fn test_new_document() {
        let doc = StyledDocument::new();
        assert_eq!(doc.len(), 0);
        assert!(doc.is_empty());
        assert_eq!(doc.paragraph_range(0), 0..0);
    }

    #[test]
    fn test_paragraph_range() {
        let doc = doc("ab\ncd\n\nef");
        assert_eq!(doc.paragraph_range(0), 0..3);
        assert_eq!(doc.paragraph_range(2), 0..3);
        assert_eq!(doc.paragraph_range(3), 3..6);
        assert_eq!(doc.paragraph_range(6), 6..7);
        assert_eq!(doc.paragraph_range(8), 7..9);
        assert_eq!(doc.paragraph_range(9), 7..9);
        assert_eq!(doc.paragraph_ranges(), vec![0..3, 3..6, 6..7, 7..9]);
    }

    #[test]
    fn test_paragraph_range_trailing_newline() {
        let doc = doc("abc\n");
        assert_eq!(doc.paragraph_range(4), 0..4);
        assert_eq!(doc.paragraph_ranges(), vec![0..4]);
    }

    #[test]
    fn test_insert_inherits_previous_character() {
        let mut doc = doc("Hello");
        doc.apply_edit(EditOp::format(
            0..5,
            StyleChange {
                bold: Some(true),
                ..Default::default()
            },
        ))
        .unwrap();
        doc.apply_edit(EditOp::insert(5, " world")).unwrap();
        assert_eq!(doc.text(), "Hello world");
        assert_eq!(doc.runs().len(), 1);
        assert!(doc.attributes_at(8).font.bold);
    }

    #[test]
    fn test_insert_into_empty_uses_defaults() {
        let defaults = StyleAttributes {
            font: FontDescriptor::new("Menlo", 12.0),
            ..Default::default()
        };
        let mut doc = StyledDocument::new().with_defaults(defaults.clone());
        let result = doc.apply_edit(EditOp::insert(0, "x")).unwrap();
        assert_eq!(result.new_cursor, 1);
        assert_eq!(doc.attributes_at(0), &defaults);
    }

    #[test]
    fn test_insert_splits_run_symmetrically() {
        let mut doc = doc("abcdef");
        let italic = StyleAttributes {
            font: FontDescriptor::default().italic(),
            ..Default::default()
        };
        doc.apply_edit(EditOp::insert_styled(3, "XY", italic)).unwrap();
        let runs = doc.runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].attributes, runs[2].attributes);
        assert_eq!(runs[1].range, 3..5);
    }

    #[test]
    fn test_delete() {
        let mut doc = doc("Hello World");
        let result = doc.apply_edit(EditOp::delete(5, 11)).unwrap();
        assert_eq!(doc.text(), "Hello");
        assert_eq!(result.delta(), -6);
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut doc = doc("abc");
        assert!(matches!(
            doc.apply_edit(EditOp::insert(4, "x")),
            Err(EditError::OutOfBounds { .. })
        ));
        assert!(matches!(
            doc.apply_edit(EditOp::delete(2, 1)),
            Err(EditError::InvertedRange { .. })
        ));
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_failed_transaction_is_atomic() {
        let mut doc = doc("abc");
        let op = EditOp::transaction(vec![EditOp::insert(0, "zz"), EditOp::delete(0, 50)]);
        assert!(doc.apply_edit(op).is_err());
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn test_transaction() {
        let mut doc = doc("Hello World");
        let op = EditOp::transaction(vec![EditOp::delete(0, 5), EditOp::insert(0, "Howdy")]);
        let result = doc.apply_edit(op).unwrap();
        assert_eq!(doc.text(), "Howdy World");
        assert_eq!(result.start, 0);
        assert_eq!(result.new_end, 5);
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn test_replace_keeps_replaced_style() {
        let mut doc = doc("one two");
        doc.apply_edit(EditOp::format(
            4..7,
            StyleChange {
                size: Some(30.0),
                ..Default::default()
            },
        ))
        .unwrap();
        doc.apply_edit(EditOp::replace(4..7, "three")).unwrap();
        assert_eq!(doc.text(), "one three");
        assert_eq!(doc.attributes_at(8).font.size, 30.0);
    }

    #[test]
    fn test_format_paragraph_change_widens() {
        let mut doc = doc("first\nsecond\nthird");
        let result = doc
            .apply_edit(EditOp::format(
                8..9,
                StyleChange {
                    alignment: Some(Alignment::Center),
                    ..Default::default()
                },
            ))
            .unwrap();
        assert_eq!(result.kind, EditKind::Format);
        assert_eq!(result.start, 6);
        assert_eq!(result.new_end, 13);
        assert_eq!(doc.paragraph_style_at(6).alignment, Alignment::Center);
        assert_eq!(doc.paragraph_style_at(12).alignment, Alignment::Center);
        assert_eq!(doc.paragraph_style_at(0).alignment, Alignment::Left);
        assert_eq!(doc.paragraph_style_at(14).alignment, Alignment::Left);
    }

    #[test]
    fn test_substring_preserves_runs() {
        let mut doc = doc("abcdef");
        doc.apply_edit(EditOp::format(
            2..4,
            StyleChange {
                bold: Some(true),
                ..Default::default()
            },
        ))
        .unwrap();
        let sub = doc.substring(1..5);
        assert_eq!(sub.text(), "bcde");
        let ranges: Vec<_> = sub.runs().iter().map(|r| r.range.clone()).collect();
        assert_eq!(ranges, vec![0..1, 1..3, 3..4]);
        assert!(sub.attributes_at(1).font.bold);
    }

    #[test]
    fn test_from_runs_validates() {
        let attrs = StyleAttributes::default();
        assert!(StyledDocument::from_runs("abc", vec![StyledRun::new(0..3, attrs.clone())]).is_ok());
        assert!(StyledDocument::from_runs("abc", vec![StyledRun::new(0..2, attrs)]).is_err());
    }

    #[test]
    fn test_apply_body_style_skips_headings() {
        let mut doc = doc("Title\nBody text");
        doc.apply_edit(EditOp::format(
            0..6,
            StyleChange {
                size: Some(28.0),
                bold: Some(true),
                ..Default::default()
            },
        ))
        .unwrap();
        doc.apply_edit(EditOp::format(
            6..10,
            StyleChange {
                italic: Some(true),
                ..Default::default()
            },
        ))
        .unwrap();

        let body = BodyStyle {
            font_family: "Palatino".to_string(),
            font_size: 12.0,
            ..Default::default()
        };
        doc.apply_body_style(&body);

        assert_eq!(doc.attributes_at(0).font.size, 28.0);
        assert_eq!(doc.attributes_at(0).font.family, DEFAULT_FONT_FAMILY);
        let body_font = &doc.attributes_at(7).font;
        assert_eq!(body_font.family, "Palatino");
        assert_eq!(body_font.size, 12.0);
        assert!(body_font.italic);
        assert_eq!(doc.attributes_at(12).paragraph.line_height_multiple, 1.5);
        assert_eq!(doc.default_attributes().font.size, 12.0);
    }

    #[test]
    fn test_apply_body_style_keeps_explicit_alignment() {
        let mut doc = doc("centered");
        doc.apply_edit(EditOp::format(
            0..0,
            StyleChange {
                alignment: Some(Alignment::Center),
                ..Default::default()
            },
        ))
        .unwrap();
        doc.apply_body_style(&BodyStyle {
            alignment: Alignment::Justified,
            ..Default::default()
        });
        assert_eq!(doc.paragraph_style_at(0).alignment, Alignment::Center);
    }
}
