//! Font metrics for layout

use crate::document::{FontDescriptor, DEFAULT_FONT_FAMILY};
use log::debug;
use rustc_hash::FxHashMap;

/// Advance scale applied to bold text
pub const BOLD_ADVANCE_SCALE: f32 = 1.05;

/// Metrics needed for text layout, in em units
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Height above the baseline
    pub ascent: f32,
    /// Depth below the baseline
    pub descent: f32,
    /// Width of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Default width for non-ASCII characters
    pub default_width: f32,
}

impl Default for FontMetrics {
    /// Approximation of a proportional book serif
    fn default() -> Self {
        let char_widths = (0u8..128).map(|b| proportional_width(b as char)).collect();
        Self {
            ascent: 0.917,
            descent: 0.219,
            char_widths,
            default_width: 0.55,
        }
    }
}

fn proportional_width(c: char) -> f32 {
    match c {
        ' ' => 0.25,
        'i' | 'j' | 'l' | '\'' | '|' | '.' | ',' | ':' | ';' | '!' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '"' => 0.36,
        'm' | 'w' | 'M' | 'W' | '@' => 0.82,
        'A'..='Z' => 0.66,
        '0'..='9' => 0.55,
        c if c.is_ascii_control() => 0.0,
        _ => 0.5,
    }
}

impl FontMetrics {
    pub fn new(ascent: f32, descent: f32, char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            ascent,
            descent,
            char_widths,
            default_width,
        }
    }

    /// Fixed-width font; ascent + descent is exactly one em
    pub fn monospace(advance_em: f32) -> Self {
        Self {
            ascent: 0.8,
            descent: 0.2,
            char_widths: vec![advance_em; 128],
            default_width: advance_em,
        }
    }

    /// Get width of a character in em
    pub fn width(&self, c: char) -> f32 {
        match c {
            '\t' => self.width(' ') * 4.0,
            '\n' | '\r' | '\u{2028}' | '\u{2029}' => 0.0,
            c if c.is_ascii() => self.char_widths.get(c as usize).copied().unwrap_or(self.default_width),
            _ => self.default_width,
        }
    }

    /// Advance of a grapheme cluster in points
    ///
    /// The cluster's first scalar carries the advance; combining marks add nothing.
    pub fn advance(&self, grapheme: &str, font: &FontDescriptor) -> f32 {
        let em = grapheme.chars().next().map_or(0.0, |c| self.width(c));
        let scale = if font.bold { BOLD_ADVANCE_SCALE } else { 1.0 };
        em * font.size * scale
    }

    /// Natural line height in points at `size`
    pub fn line_height(&self, size: f32) -> f32 {
        size * (self.ascent + self.descent)
    }
}

/// Library of loaded fonts, keyed by lowercase family name
#[derive(Debug, Clone)]
pub struct FontLibrary {
    fonts: FxHashMap<String, FontMetrics>,
    /// Used for any family that is not loaded
    fallback: FontMetrics,
}

impl Default for FontLibrary {
    fn default() -> Self {
        let mut library = Self::with_fallback(FontMetrics::default());
        library.insert(DEFAULT_FONT_FAMILY, FontMetrics::default());
        library
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty library that resolves every family to `fallback`
    pub fn with_fallback(fallback: FontMetrics) -> Self {
        Self {
            fonts: FxHashMap::default(),
            fallback,
        }
    }

    /// Add or replace the metrics of a family
    pub fn insert(&mut self, family: &str, metrics: FontMetrics) {
        self.fonts.insert(family.to_lowercase(), metrics);
    }

    /// Get font metrics by family
    pub fn get(&self, family: &str) -> Option<&FontMetrics> {
        self.fonts.get(&family.to_lowercase())
    }

    /// Metrics for `family`, falling back to the default font
    pub fn resolve(&self, family: &str) -> &FontMetrics {
        match self.get(family) {
            Some(metrics) => metrics,
            None => {
                debug!("font '{}' not loaded, using fallback metrics", family);
                &self.fallback
            }
        }
    }

    pub fn fallback(&self) -> &FontMetrics {
        &self.fallback
    }
}
