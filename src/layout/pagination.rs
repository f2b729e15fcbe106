//! Pagination for multi-page documents

use crate::document::StyledDocument;
use crate::error::LayoutError;
use crate::layout::engine::{shift, LineLayout, TextLayoutEngine};
use crate::layout::geometry::PageGeometry;
use crate::Size;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Default bound on page-fit passes in one pagination run
pub const DEFAULT_MAX_ITERATIONS: usize = 2000;

/// Pagination tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Safety bound on fit passes; a tunable limit, not a page-count contract
    pub max_iterations: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// One laid-out page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Page number (1-based)
    pub number: usize,
    /// Characters of the source document on this page
    pub range: Range<usize>,
    /// The page's slice of the document, offsets rebased to zero
    pub content: StyledDocument,
    /// Lines placed by the pass that produced this page, in source offsets
    pub lines: Vec<LineLayout>,
}

impl Page {
    /// An empty page
    pub fn empty(number: usize, doc: &StyledDocument) -> Self {
        Self {
            number,
            range: 0..0,
            content: StyledDocument::new().with_defaults(doc.default_attributes().clone()),
            lines: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Check if this page holds the character at `offset`
    pub fn contains(&self, offset: usize) -> bool {
        self.range.contains(&offset)
    }

    /// Same page moved by `delta` characters and renumbered
    pub fn relocated(&self, delta: isize, number: usize) -> Page {
        Page {
            number,
            range: shift(self.range.start, delta)..shift(self.range.end, delta),
            content: self.content.clone(),
            lines: self.lines.iter().map(|line| line.shifted(delta)).collect(),
        }
    }
}

/// Outcome of fitting a single page
#[derive(Debug, Clone, PartialEq)]
pub enum PageFit {
    Fitted(Page),
    /// The engine consumed nothing
    Stalled,
    Failed(LayoutError),
}

/// Splits a document into pages
pub struct Paginator<'a> {
    engine: &'a dyn TextLayoutEngine,
    config: PaginationConfig,
}

impl<'a> Paginator<'a> {
    pub fn new(engine: &'a dyn TextLayoutEngine, config: PaginationConfig) -> Self {
        Self { engine, config }
    }

    /// Full pagination pass
    ///
    /// Never fails: degenerate geometry, engine errors and stalls all degrade to a
    /// page set that still covers the whole document.
    pub fn paginate(&self, doc: &StyledDocument, geometry: &PageGeometry) -> Vec<Page> {
        if !geometry.has_content_box() {
            debug!(
                "content box {}x{} is empty, using a single page",
                geometry.content_width(),
                geometry.content_height()
            );
            return vec![Page {
                number: 1,
                range: 0..doc.len(),
                content: doc.substring(0..doc.len()),
                lines: Vec::new(),
            }];
        }
        if doc.is_empty() {
            return vec![Page::empty(1, doc)];
        }

        let mut pages = Vec::new();
        self.paginate_from(doc, geometry, 0, &mut pages);
        pages
    }

    /// Fit pages from `start` to the end of the document, appending to `pages`
    ///
    /// Every page already in `pages` counts as one fit pass against the iteration cap,
    /// so continuing a partial page list stops where a full pass would.
    pub fn paginate_from(
        &self,
        doc: &StyledDocument,
        geometry: &PageGeometry,
        start: usize,
        pages: &mut Vec<Page>,
    ) {
        let len = doc.len();
        let mut cursor = start;

        while cursor < len {
            let number = pages.len() + 1;
            if pages.len() >= self.config.max_iterations {
                warn!(
                    "pagination hit the {} pass limit at offset {}; remaining text goes on one page",
                    self.config.max_iterations, cursor
                );
                pages.push(self.overflow_page(doc, cursor, geometry, number));
                return;
            }

            match self.fit_page(doc, cursor, geometry, number) {
                PageFit::Fitted(page) => {
                    cursor = page.range.end;
                    pages.push(page);
                }
                PageFit::Stalled => {
                    warn!("layout made no progress at offset {}; remaining text goes on one page", cursor);
                    pages.push(self.overflow_page(doc, cursor, geometry, number));
                    return;
                }
                PageFit::Failed(err) => {
                    warn!("layout failed at offset {}: {}; falling back to plain text", cursor, err);
                    pages.push(plain_text_page(doc, cursor, number));
                    return;
                }
            }
        }
    }

    /// Fit one page starting at `start`
    pub fn fit_page(
        &self,
        doc: &StyledDocument,
        start: usize,
        geometry: &PageGeometry,
        number: usize,
    ) -> PageFit {
        match self.engine.fit(doc, start, geometry.content_size()) {
            Ok(fit) => {
                let end = fit.range.end.min(doc.len());
                if end <= start {
                    return PageFit::Stalled;
                }
                trace!("page {} covers {}..{}", number, start, end);
                PageFit::Fitted(Page {
                    number,
                    range: start..end,
                    content: doc.substring(start..end),
                    lines: fit.lines,
                })
            }
            Err(err) => PageFit::Failed(err),
        }
    }

    /// Everything from `start` on one page, laid out without a height limit
    fn overflow_page(
        &self,
        doc: &StyledDocument,
        start: usize,
        geometry: &PageGeometry,
        number: usize,
    ) -> Page {
        let unbounded = Size::new(geometry.content_width(), f32::INFINITY);
        let lines = self
            .engine
            .fit(doc, start, unbounded)
            .map(|fit| fit.lines)
            .unwrap_or_default();
        Page {
            number,
            range: start..doc.len(),
            content: doc.substring(start..doc.len()),
            lines,
        }
    }
}

/// Best-effort page: the remaining text, unstyled
fn plain_text_page(doc: &StyledDocument, start: usize, number: usize) -> Page {
    let text = doc.text_range(start..doc.len());
    Page {
        number,
        range: start..doc.len(),
        content: StyledDocument::from_plain_text(&text, doc.default_attributes().clone()),
        lines: Vec::new(),
    }
}
