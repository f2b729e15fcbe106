//! Editor settings
//!
//! Everything here deserializes from JSON with defaults for missing fields, so a host
//! can persist only what the user changed.

use crate::document::{Alignment, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};
use crate::error::ConfigError;
use crate::layout::{PageGeometry, PaginationConfig};
use serde::{Deserialize, Serialize};

/// Paper sizes in points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    Letter,
    A4,
    A5,
    Legal,
    Custom {
        width: f32,
        height: f32,
    },
}

impl PaperSize {
    /// Width and height in points
    pub fn dimensions(&self) -> (f32, f32) {
        match *self {
            PaperSize::Letter => (612.0, 792.0),
            PaperSize::A4 => (595.28, 841.89),
            PaperSize::A5 => (419.53, 595.28),
            PaperSize::Legal => (612.0, 1008.0),
            PaperSize::Custom { width, height } => (width, height),
        }
    }
}

/// Page margins in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(72.0)
    }
}

impl Margins {
    pub fn uniform(margin: f32) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }
}

/// Paper and margins as chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub paper: PaperSize,
    pub margins: Margins,
}

impl PageSetup {
    pub fn geometry(&self) -> PageGeometry {
        let (paper_width, paper_height) = self.paper.dimensions();
        PageGeometry {
            paper_width,
            paper_height,
            margin_top: self.margins.top,
            margin_bottom: self.margins.bottom,
            margin_left: self.margins.left,
            margin_right: self.margins.right,
        }
    }
}

impl From<PageSetup> for PageGeometry {
    fn from(setup: PageSetup) -> Self {
        setup.geometry()
    }
}

/// Document body typography
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyStyle {
    pub font_family: String,
    pub font_size: f32,
    /// Line height multiple
    pub line_spacing: f32,
    /// Points after each paragraph
    pub paragraph_spacing: f32,
    /// Points before each paragraph
    pub paragraph_spacing_before: f32,
    pub first_line_indent: f32,
    pub alignment: Alignment,
    pub hyphenation: bool,
}

impl Default for BodyStyle {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            line_spacing: 1.5,
            paragraph_spacing: 12.0,
            paragraph_spacing_before: 0.0,
            first_line_indent: 0.0,
            alignment: Alignment::Left,
            hyphenation: false,
        }
    }
}

/// What the page renderer draws besides text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub show_margin_guides: bool,
    pub show_page_numbers: bool,
    pub page_number_font_size: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_margin_guides: false,
            show_page_numbers: true,
            page_number_font_size: 10.0,
        }
    }
}

/// Session behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub pagination: PaginationConfig,
    /// Quiet period before an autosave fires
    pub autosave_debounce_ms: u64,
    /// Vertical gap between pages in the scroll view
    pub page_spacing: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pagination: PaginationConfig::default(),
            autosave_debounce_ms: 2000,
            page_spacing: 48.0,
        }
    }
}

/// All editor settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub page: PageSetup,
    pub body: BodyStyle,
    pub render: RenderOptions,
    pub session: SessionConfig,
}

impl EditorSettings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: EditorSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = self.page.paper.dimensions();
        positive("page.paper.width", width)?;
        positive("page.paper.height", height)?;
        positive("body.font_size", self.body.font_size)?;
        positive("body.line_spacing", self.body.line_spacing)?;
        positive("render.page_number_font_size", self.render.page_number_font_size)?;
        if self.session.pagination.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "session.pagination.max_iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive size, got {}", value),
        })
    }
}
