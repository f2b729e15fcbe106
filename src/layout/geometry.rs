//! Page geometry in points

use crate::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Paper size and margins of every page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub paper_width: f32,
    pub paper_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // US Letter, 1 inch margins
        Self::with_uniform_margins(612.0, 792.0, 72.0)
    }
}

impl PageGeometry {
    pub fn with_uniform_margins(paper_width: f32, paper_height: f32, margin: f32) -> Self {
        Self {
            paper_width,
            paper_height,
            margin_top: margin,
            margin_bottom: margin,
            margin_left: margin,
            margin_right: margin,
        }
    }

    /// Get usable content width
    pub fn content_width(&self) -> f32 {
        self.paper_width - self.margin_left - self.margin_right
    }

    /// Get usable content height per page
    pub fn content_height(&self) -> f32 {
        self.paper_height - self.margin_top - self.margin_bottom
    }

    pub fn content_size(&self) -> Size {
        Size::new(self.content_width(), self.content_height())
    }

    /// False when either content dimension is non-positive
    pub fn has_content_box(&self) -> bool {
        self.content_width() > 0.0 && self.content_height() > 0.0
    }

    pub fn paper_size(&self) -> Size {
        Size::new(self.paper_width, self.paper_height)
    }

    pub fn paper_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.paper_width, self.paper_height)
    }

    /// Content box in page coordinates
    pub fn content_rect(&self) -> Rect {
        Rect::new(
            self.margin_left,
            self.margin_top,
            self.content_width(),
            self.content_height(),
        )
    }
}
