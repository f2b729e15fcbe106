//! Text layout engine interface and the metrics-based implementation

use crate::document::{Alignment, FontDescriptor, StyledDocument};
use crate::error::LayoutError;
use crate::layout::font::{FontLibrary, FontMetrics};
use crate::layout::line_break::{LineBreaker, ParagraphSpan};
use crate::Size;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Layout result for a single line
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    /// Character range this line covers, including hanging whitespace and the
    /// paragraph break
    pub range: Range<usize>,
    /// Top of the line relative to the content box
    pub y: f32,
    /// Line height
    pub height: f32,
    /// Baseline offset from top of line
    pub baseline: f32,
    /// Left offset of the first cluster (first-line indent)
    pub x: f32,
    /// Width of the visible content
    pub width: f32,
    /// Broken inside a word with hyphenation enabled
    pub hyphenated: bool,
    /// Alignment of the paragraph this line belongs to
    pub alignment: Alignment,
}

impl LineLayout {
    /// Same line with its range moved by `delta` characters
    pub fn shifted(&self, delta: isize) -> LineLayout {
        LineLayout {
            range: shift(self.range.start, delta)..shift(self.range.end, delta),
            ..self.clone()
        }
    }
}

pub(crate) fn shift(offset: usize, delta: isize) -> usize {
    (offset as isize + delta).max(0) as usize
}

/// What fits into one container
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitResult {
    /// Consumed character range, starting at the requested offset
    pub range: Range<usize>,
    /// Positioned lines
    pub lines: Vec<LineLayout>,
    /// Height used, including paragraph spacing
    pub height: f32,
}

/// Measured extent of a string
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

/// Given text, styles and a container, decide what fits
pub trait TextLayoutEngine: Send + Sync {
    /// Lay out `doc` from `start` into `container`
    ///
    /// A paragraph entered mid-way is still broken from its own start, so line breaks
    /// do not depend on where a page began.
    fn fit(
        &self,
        doc: &StyledDocument,
        start: usize,
        container: Size,
    ) -> Result<FitResult, LayoutError>;

    /// Measure a single-line string
    fn measure(&self, text: &str, font: &FontDescriptor) -> Result<TextMetrics, LayoutError>;
}

/// Layout engine driven by per-character font metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsLayoutEngine {
    fonts: FontLibrary,
    breaker: LineBreaker,
}

impl MetricsLayoutEngine {
    pub fn new(fonts: FontLibrary) -> Self {
        Self {
            fonts,
            breaker: LineBreaker::new(),
        }
    }

    /// Every family resolves to one fixed-width font
    pub fn monospace(advance_em: f32) -> Self {
        Self::new(FontLibrary::with_fallback(FontMetrics::monospace(advance_em)))
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    fn layout_paragraph(
        &self,
        doc: &StyledDocument,
        paragraph: Range<usize>,
        width: f32,
    ) -> Result<Vec<LineLayout>, LayoutError> {
        let text = doc.text_range(paragraph.clone());
        let spans: Vec<ParagraphSpan<'_>> = doc
            .runs_in(paragraph.clone())
            .map(|run| ParagraphSpan {
                start: run.range.start.max(paragraph.start) - paragraph.start,
                end: run.range.end.min(paragraph.end) - paragraph.start,
                font: &run.attributes.font,
            })
            .collect();
        let style = doc.paragraph_style_at(paragraph.start);
        self.breaker
            .break_paragraph(&text, paragraph.start, &spans, style, width, &self.fonts)
    }
}

impl TextLayoutEngine for MetricsLayoutEngine {
    fn fit(
        &self,
        doc: &StyledDocument,
        start: usize,
        container: Size,
    ) -> Result<FitResult, LayoutError> {
        let valid_width = container.width.is_finite() && container.width > 0.0;
        if !valid_width || !(container.height > 0.0) {
            return Err(LayoutError::InvalidContainer {
                width: container.width,
                height: container.height,
            });
        }
        let len = doc.len();
        if start > len {
            return Err(LayoutError::OffsetOutOfRange { offset: start, len });
        }

        let mut lines: Vec<LineLayout> = Vec::new();
        let mut y: f32 = 0.0;
        let mut end = start;
        let mut paragraph_start = if start < len {
            doc.paragraph_range(start).start
        } else {
            len
        };

        while paragraph_start < len {
            let paragraph = doc.paragraph_range(paragraph_start);
            let style = doc.paragraph_style_at(paragraph.start);
            // Spacing before is dropped at the top of a page
            if !lines.is_empty() {
                y += style.spacing_before;
            }
            let spacing_after = style.spacing_after;

            for mut line in self.layout_paragraph(doc, paragraph.clone(), container.width)? {
                if line.range.end <= start {
                    continue;
                }
                // A page always takes at least one line
                if y + line.height > container.height && !lines.is_empty() {
                    return Ok(FitResult {
                        range: start..end,
                        lines,
                        height: y,
                    });
                }
                line.range.start = line.range.start.max(start);
                line.y = y;
                y += line.height;
                end = line.range.end;
                lines.push(line);
            }

            y += spacing_after;
            paragraph_start = paragraph.end;
        }

        Ok(FitResult {
            range: start..end,
            lines,
            height: y,
        })
    }

    fn measure(&self, text: &str, font: &FontDescriptor) -> Result<TextMetrics, LayoutError> {
        let metrics = self.fonts.resolve(&font.family);
        let width: f32 = text
            .graphemes(true)
            .map(|g| metrics.advance(g, font))
            .sum();
        let measured = TextMetrics {
            width,
            ascent: metrics.ascent * font.size,
            descent: metrics.descent * font.size,
        };
        if !(measured.width.is_finite() && measured.ascent.is_finite()) {
            return Err(LayoutError::NonFiniteMetrics {
                family: font.family.clone(),
            });
        }
        Ok(measured)
    }
}
