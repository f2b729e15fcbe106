//! Folio: a paginated styled-text layout core
//!
//! This crate provides the page engine behind a WYSIWYG editor:
//! - Styled document model over a rope with normalized attribute runs
//! - Page flow through a pluggable text layout engine
//! - Incremental repagination that reuses pages an edit cannot reach
//! - Page display lists shared by preview, thumbnails and export

pub mod config;
pub mod document;
pub mod editing;
pub mod error;
pub mod export;
pub mod layout;
pub mod render;
pub mod session;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmSession;

// Re-export primary types
pub use config::{
    BodyStyle, EditorSettings, Margins, PageSetup, PaperSize, RenderOptions, SessionConfig,
};
pub use document::{
    Alignment, FontDescriptor, HeadingClassifier, JsonCodec, OutlineEntry, ParagraphStyle,
    RichTextCodec, StyleAttributes, StyleChange, StyledDocument, StyledRun,
};
pub use editing::{Affinity, EditKind, EditOp, EditResult, Selection};
pub use error::{CodecError, ConfigError, EditError, LayoutError};
pub use export::{render_document, spawn_export, ExportSnapshot};
pub use layout::{
    FitResult, LineLayout, MetricsLayoutEngine, Page, PageGeometry, PaginationConfig,
    Paginator, TextLayoutEngine,
};
pub use render::{DisplayItem, PageDiff, PagePatch, PageRenderer, RenderedPage};
pub use session::{DocumentId, PaginatedEditingSession, SessionEvent, SessionPhase};

/// Page coordinates in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

/// Width and height in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Page rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Scale about the origin (thumbnails, zoom)
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rect_geometry() {
        let rect = Rect::new(10.0, 10.0, 20.0, 30.0);
        assert!(rect.contains_point(Point::new(15.0, 40.0)));
        assert!(!rect.contains_point(Point::new(31.0, 15.0)));
        assert!(rect.intersects(&Rect::new(25.0, 0.0, 10.0, 15.0)));
        assert!(!rect.intersects(&Rect::new(30.0, 0.0, 10.0, 15.0)));
        assert_eq!(rect.scaled(0.5), Rect::new(5.0, 5.0, 10.0, 15.0));
        assert_eq!(rect.size(), Size::new(20.0, 30.0));
    }

    #[test]
    fn test_session_end_to_end() {
        let settings = EditorSettings::default();
        let mut doc = StyledDocument::new();
        doc.apply_body_style(&settings.body);

        let mut session = PaginatedEditingSession::new(
            DocumentId(1),
            doc,
            Arc::new(MetricsLayoutEngine::default()),
            settings.session,
        );
        session.set_geometry(settings.page.geometry());
        session
            .insert(0, &"A paragraph of body text.\n".repeat(120))
            .unwrap();

        assert!(session.page_count() > 1);
        let exported = session
            .export_snapshot()
            .unwrap()
            .render(&settings.render);
        assert_eq!(exported.len(), session.page_count());
        for (page, rendered) in session.pages().iter().zip(&exported) {
            assert_eq!(
                session.render_page(page.number, &settings.render).as_ref(),
                Some(rendered)
            );
        }
    }
}
