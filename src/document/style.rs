//! Character and paragraph formatting attributes

use serde::{Deserialize, Serialize};

/// Default body font family
pub const DEFAULT_FONT_FAMILY: &str = "Georgia";

/// Default body font size in points
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Horizontal alignment of a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

/// Font selection for a run of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: String,
    /// Point size
    pub size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
        }
    }
}

impl FontDescriptor {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
            italic: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}

/// Paragraph-level layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphStyle {
    pub alignment: Alignment,
    /// Multiplier applied to the natural line height
    pub line_height_multiple: f32,
    /// Points above the paragraph (skipped at the top of a page)
    pub spacing_before: f32,
    /// Points below the paragraph
    pub spacing_after: f32,
    /// Extra indent of the first line in points
    pub first_line_indent: f32,
    pub hyphenation: bool,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            line_height_multiple: 1.0,
            spacing_before: 0.0,
            spacing_after: 0.0,
            first_line_indent: 0.0,
            hyphenation: false,
        }
    }
}

/// Full set of attributes carried by a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleAttributes {
    pub font: FontDescriptor,
    #[serde(default)]
    pub paragraph: ParagraphStyle,
}

impl StyleAttributes {
    pub fn new(font: FontDescriptor, paragraph: ParagraphStyle) -> Self {
        Self { font, paragraph }
    }
}

/// A partial change to apply over a range
///
/// Font fields touch only the characters in the range. Paragraph fields are widened to
/// every paragraph the range touches.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleChange {
    pub family: Option<String>,
    pub size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub alignment: Option<Alignment>,
    pub line_height_multiple: Option<f32>,
    pub spacing_before: Option<f32>,
    pub spacing_after: Option<f32>,
    pub first_line_indent: Option<f32>,
    pub hyphenation: Option<bool>,
}

impl StyleChange {
    /// Whether any paragraph-level field is set
    pub fn touches_paragraph(&self) -> bool {
        self.alignment.is_some()
            || self.line_height_multiple.is_some()
            || self.spacing_before.is_some()
            || self.spacing_after.is_some()
            || self.first_line_indent.is_some()
            || self.hyphenation.is_some()
    }

    /// Whether any font field is set
    pub fn touches_font(&self) -> bool {
        self.family.is_some() || self.size.is_some() || self.bold.is_some() || self.italic.is_some()
    }

    pub(crate) fn apply_font(&self, font: &mut FontDescriptor) {
        if let Some(family) = &self.family {
            font.family = family.clone();
        }
        if let Some(size) = self.size {
            font.size = size;
        }
        if let Some(bold) = self.bold {
            font.bold = bold;
        }
        if let Some(italic) = self.italic {
            font.italic = italic;
        }
    }

    pub(crate) fn apply_paragraph(&self, style: &mut ParagraphStyle) {
        if let Some(alignment) = self.alignment {
            style.alignment = alignment;
        }
        if let Some(multiple) = self.line_height_multiple {
            style.line_height_multiple = multiple;
        }
        if let Some(before) = self.spacing_before {
            style.spacing_before = before;
        }
        if let Some(after) = self.spacing_after {
            style.spacing_after = after;
        }
        if let Some(indent) = self.first_line_indent {
            style.first_line_indent = indent;
        }
        if let Some(hyphenation) = self.hyphenation {
            style.hyphenation = hyphenation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_change_scopes() {
        let font_only = StyleChange {
            bold: Some(true),
            ..Default::default()
        };
        assert!(font_only.touches_font());
        assert!(!font_only.touches_paragraph());

        let para_only = StyleChange {
            alignment: Some(Alignment::Center),
            ..Default::default()
        };
        assert!(para_only.touches_paragraph());
        assert!(!para_only.touches_font());
    }

    #[test]
    fn test_apply_change() {
        let mut attrs = StyleAttributes::default();
        let change = StyleChange {
            size: Some(28.0),
            bold: Some(true),
            spacing_after: Some(6.0),
            ..Default::default()
        };
        change.apply_font(&mut attrs.font);
        change.apply_paragraph(&mut attrs.paragraph);

        assert_eq!(attrs.font.size, 28.0);
        assert!(attrs.font.bold);
        assert_eq!(attrs.font.family, DEFAULT_FONT_FAMILY);
        assert_eq!(attrs.paragraph.spacing_after, 6.0);
    }
}
