//! Line breaking algorithm

use crate::document::{FontDescriptor, ParagraphStyle};
use crate::error::LayoutError;
use crate::layout::engine::LineLayout;
use crate::layout::font::{FontLibrary, FontMetrics};
use std::ops::Range;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

/// A font span inside a paragraph, in paragraph-relative character offsets
#[derive(Debug, Clone, Copy)]
pub struct ParagraphSpan<'a> {
    pub start: usize,
    pub end: usize,
    pub font: &'a FontDescriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClusterKind {
    Text,
    Space,
    /// U+2028, U+2029 or a bare CR: forces a new line inside the paragraph
    LineSeparator,
    /// The paragraph's terminating newline
    ParagraphEnd,
}

#[derive(Debug, Clone)]
struct Cluster {
    /// Paragraph-relative character range
    chars: Range<usize>,
    /// Break allowed before this cluster (UAX #14)
    break_before: bool,
    width: f32,
    /// Scaled ascent and descent in points
    ascent: f32,
    descent: f32,
    kind: ClusterKind,
}

impl Cluster {
    fn is_hanging(&self) -> bool {
        self.kind != ClusterKind::Text
    }
}

/// Greedy line breaker over grapheme clusters
#[derive(Debug, Default, Clone, Copy)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Layout a paragraph into lines
    ///
    /// `text` is the whole paragraph (terminating newline included) starting at the
    /// absolute offset `start`. Lines come back with absolute ranges and `y == 0`.
    pub fn break_paragraph(
        &self,
        text: &str,
        start: usize,
        spans: &[ParagraphSpan<'_>],
        style: &ParagraphStyle,
        max_width: f32,
        fonts: &FontLibrary,
    ) -> Result<Vec<LineLayout>, LayoutError> {
        let clusters = collect_clusters(text, spans, fonts)?;
        if clusters.is_empty() {
            return Ok(Vec::new());
        }

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut first_line = true;
        let mut x: f32 = 0.0;
        let mut last_break: Option<usize> = None;
        let mut i = 0;

        while i < clusters.len() {
            let cluster = &clusters[i];
            let indent = if first_line { style.first_line_indent } else { 0.0 };
            let available = max_width - indent;

            if i > line_start && cluster.break_before {
                last_break = Some(i);
            }

            match cluster.kind {
                ClusterKind::LineSeparator => {
                    lines.push(finish_line(&clusters[line_start..=i], start, indent, style, false));
                    line_start = i + 1;
                    first_line = false;
                    x = 0.0;
                    last_break = None;
                    i += 1;
                    continue;
                }
                ClusterKind::Space | ClusterKind::ParagraphEnd => {
                    // Trailing whitespace hangs past the edge
                    x += cluster.width;
                    i += 1;
                    continue;
                }
                ClusterKind::Text => {}
            }

            if x + cluster.width > available && i > line_start {
                let (break_at, hyphenated) = match last_break {
                    Some(b) => (b, false),
                    // Emergency break inside a word
                    None => (i, style.hyphenation),
                };
                lines.push(finish_line(
                    &clusters[line_start..break_at],
                    start,
                    indent,
                    style,
                    hyphenated,
                ));
                line_start = break_at;
                first_line = false;
                last_break = None;
                x = clusters[line_start..i].iter().map(|c| c.width).sum();
                // Re-evaluate the current cluster on the new line
                continue;
            }

            x += cluster.width;
            i += 1;
        }

        if line_start < clusters.len() {
            let indent = if first_line { style.first_line_indent } else { 0.0 };
            lines.push(finish_line(&clusters[line_start..], start, indent, style, false));
        }

        Ok(lines)
    }
}

fn collect_clusters(
    text: &str,
    spans: &[ParagraphSpan<'_>],
    fonts: &FontLibrary,
) -> Result<Vec<Cluster>, LayoutError> {
    let fallback_font = FontDescriptor::default();
    let metrics: Vec<&FontMetrics> = spans.iter().map(|s| fonts.resolve(&s.font.family)).collect();

    let mut breaks = linebreaks(text)
        .filter(|(_, opportunity)| *opportunity == BreakOpportunity::Allowed)
        .map(|(byte, _)| byte)
        .peekable();

    let grapheme_count = text.graphemes(true).count();
    let mut clusters = Vec::with_capacity(grapheme_count);
    let mut char_offset = 0;
    let mut span_idx = 0;

    for (idx, (byte, grapheme)) in text.grapheme_indices(true).enumerate() {
        while span_idx + 1 < spans.len() && spans[span_idx].end <= char_offset {
            span_idx += 1;
        }
        let (font, font_metrics) = match spans.get(span_idx) {
            Some(span) => (span.font, metrics[span_idx]),
            None => (&fallback_font, fonts.fallback()),
        };

        while breaks.next_if(|b| *b < byte).is_some() {}
        let break_before = breaks.next_if_eq(&byte).is_some();

        let width = font_metrics.advance(grapheme, font);
        let ascent = font_metrics.ascent * font.size;
        let descent = font_metrics.descent * font.size;
        if !(width.is_finite() && ascent.is_finite() && descent.is_finite()) {
            return Err(LayoutError::NonFiniteMetrics {
                family: font.family.clone(),
            });
        }

        let is_last = idx + 1 == grapheme_count;
        let kind = if grapheme.ends_with('\n') && is_last {
            ClusterKind::ParagraphEnd
        } else if matches!(grapheme, "\r" | "\n" | "\r\n" | "\u{2028}" | "\u{2029}") {
            ClusterKind::LineSeparator
        } else if grapheme.chars().all(char::is_whitespace) {
            ClusterKind::Space
        } else {
            ClusterKind::Text
        };

        let len = grapheme.chars().count();
        clusters.push(Cluster {
            chars: char_offset..char_offset + len,
            break_before,
            width,
            ascent,
            descent,
            kind,
        });
        char_offset += len;
    }

    Ok(clusters)
}

fn finish_line(
    clusters: &[Cluster],
    start: usize,
    indent: f32,
    style: &ParagraphStyle,
    hyphenated: bool,
) -> LineLayout {
    let range = match (clusters.first(), clusters.last()) {
        (Some(first), Some(last)) => start + first.chars.start..start + last.chars.end,
        _ => start..start,
    };
    let visible = clusters
        .iter()
        .rposition(|c| !c.is_hanging())
        .map_or(0, |last| last + 1);
    let width = clusters[..visible].iter().map(|c| c.width).sum();

    let mut ascent: f32 = 0.0;
    let mut natural: f32 = 0.0;
    for cluster in clusters {
        ascent = ascent.max(cluster.ascent);
        natural = natural.max(cluster.ascent + cluster.descent);
    }

    LineLayout {
        range,
        y: 0.0,
        height: natural * style.line_height_multiple,
        baseline: ascent,
        x: indent,
        width,
        hyphenated,
        alignment: style.alignment,
    }
}
