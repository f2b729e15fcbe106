//! Display list: render-ready representation of a page

use crate::config::RenderOptions;
use crate::document::{Alignment, FontDescriptor};
use crate::layout::{LineLayout, Page, PageGeometry, TextLayoutEngine};
use crate::{Point, Rect, Size};
use log::debug;

/// Dash pattern of the margin guide (on, off)
pub const MARGIN_GUIDE_DASH: [f32; 2] = [4.0, 4.0];

/// Smallest distance between the page-number baseline and the page bottom
pub const MIN_PAGE_NUMBER_INSET: f32 = 8.0;

/// A display item to render, in page coordinates (points, origin top-left)
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    /// Paper background
    Background { rect: Rect },
    /// Dashed outline of the content box
    MarginGuide { rect: Rect, dash: [f32; 2] },
    /// Clip subsequent text to the content box
    Clip { rect: Rect },
    /// Text run; `position` is the start of the baseline
    TextRun {
        position: Point,
        text: String,
        font: FontDescriptor,
        width: f32,
    },
    /// Footer page number; `position` is the start of the baseline
    PageNumber {
        position: Point,
        text: String,
        font_size: f32,
    },
}

impl DisplayItem {
    fn scaled(&self, factor: f32) -> DisplayItem {
        match self {
            DisplayItem::Background { rect } => DisplayItem::Background {
                rect: rect.scaled(factor),
            },
            DisplayItem::MarginGuide { rect, dash } => DisplayItem::MarginGuide {
                rect: rect.scaled(factor),
                dash: [dash[0] * factor, dash[1] * factor],
            },
            DisplayItem::Clip { rect } => DisplayItem::Clip {
                rect: rect.scaled(factor),
            },
            DisplayItem::TextRun {
                position,
                text,
                font,
                width,
            } => DisplayItem::TextRun {
                position: position.scaled(factor),
                text: text.clone(),
                font: font.clone().with_size(font.size * factor),
                width: width * factor,
            },
            DisplayItem::PageNumber {
                position,
                text,
                font_size,
            } => DisplayItem::PageNumber {
                position: position.scaled(factor),
                text: text.clone(),
                font_size: font_size * factor,
            },
        }
    }
}

/// A drawable page frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub number: usize,
    pub size: Size,
    pub items: Vec<DisplayItem>,
}

impl RenderedPage {
    /// Uniformly scaled copy, for thumbnails
    pub fn scaled(&self, factor: f32) -> RenderedPage {
        RenderedPage {
            number: self.number,
            size: Size::new(self.size.width * factor, self.size.height * factor),
            items: self.items.iter().map(|item| item.scaled(factor)).collect(),
        }
    }

    /// Text of every text run in paint order
    pub fn text_runs(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            DisplayItem::TextRun { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Turns pages into display lists
///
/// On-screen preview and export both go through here, so the same page and geometry
/// always produce the same frame.
pub struct PageRenderer<'a> {
    engine: &'a dyn TextLayoutEngine,
    options: RenderOptions,
}

impl<'a> PageRenderer<'a> {
    pub fn new(engine: &'a dyn TextLayoutEngine, options: RenderOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self, page: &Page, geometry: &PageGeometry) -> RenderedPage {
        let content_rect = geometry.content_rect();
        let mut items = vec![DisplayItem::Background {
            rect: geometry.paper_rect(),
        }];

        if self.options.show_margin_guides {
            items.push(DisplayItem::MarginGuide {
                rect: content_rect,
                dash: MARGIN_GUIDE_DASH,
            });
        }
        items.push(DisplayItem::Clip { rect: content_rect });

        // Lines are in source offsets; content offsets start at zero
        let (lines, base) = if page.lines.is_empty() && !page.content.is_empty() {
            (self.relayout(page, geometry), 0)
        } else {
            (page.lines.clone(), page.range.start)
        };
        for line in &lines {
            self.push_line(&mut items, page, line, base, geometry);
        }

        if self.options.show_page_numbers {
            items.push(self.page_number(page, geometry));
        }

        RenderedPage {
            number: page.number,
            size: geometry.paper_size(),
            items,
        }
    }

    /// Lay out page content that came without lines (fallback pages)
    fn relayout(&self, page: &Page, geometry: &PageGeometry) -> Vec<LineLayout> {
        let unbounded = Size::new(geometry.content_width(), f32::INFINITY);
        match self.engine.fit(&page.content, 0, unbounded) {
            Ok(fit) => fit.lines,
            Err(err) => {
                debug!("page {} content could not be laid out: {}", page.number, err);
                Vec::new()
            }
        }
    }

    fn push_line(
        &self,
        items: &mut Vec<DisplayItem>,
        page: &Page,
        line: &LineLayout,
        base: usize,
        geometry: &PageGeometry,
    ) {
        let content = &page.content;
        let local = line.range.start.saturating_sub(base)..line.range.end.saturating_sub(base);
        if local.is_empty() {
            return;
        }

        let available = geometry.content_width() - line.x;
        let slack = (available - line.width).max(0.0);
        let align_offset = match line.alignment {
            Alignment::Left | Alignment::Justified => 0.0,
            Alignment::Center => slack / 2.0,
            Alignment::Right => slack,
        };

        let baseline = geometry.margin_top + line.y + line.baseline;
        let mut x = geometry.margin_left + line.x + align_offset;
        let mut last_font: Option<&FontDescriptor> = None;

        for run in content.runs_in(local.clone()) {
            let segment = run.range.start.max(local.start)..run.range.end.min(local.end);
            let raw = content.text_range(segment);
            let text = raw.trim_end_matches(['\n', '\r', '\u{2028}', '\u{2029}']);
            if text.is_empty() {
                continue;
            }
            let font = &run.attributes.font;
            let width = self.measure_width(text, font);
            items.push(DisplayItem::TextRun {
                position: Point { x, y: baseline },
                text: text.to_string(),
                font: font.clone(),
                width,
            });
            x += width;
            last_font = Some(font);
        }

        if line.hyphenated {
            if let Some(font) = last_font {
                items.push(DisplayItem::TextRun {
                    position: Point { x, y: baseline },
                    text: "-".to_string(),
                    font: font.clone(),
                    width: self.measure_width("-", font),
                });
            }
        }
    }

    fn page_number(&self, page: &Page, geometry: &PageGeometry) -> DisplayItem {
        let text = page.number.to_string();
        let font = page
            .content
            .default_attributes()
            .font
            .clone()
            .with_size(self.options.page_number_font_size);
        let width = self.measure_width(&text, &font);
        let inset = MIN_PAGE_NUMBER_INSET.max(geometry.margin_bottom / 2.0);

        DisplayItem::PageNumber {
            position: Point {
                x: (geometry.paper_width - width) / 2.0,
                y: geometry.paper_height - inset,
            },
            text,
            font_size: self.options.page_number_font_size,
        }
    }

    fn measure_width(&self, text: &str, font: &FontDescriptor) -> f32 {
        match self.engine.measure(text, font) {
            Ok(metrics) => metrics.width,
            Err(err) => {
                debug!("could not measure '{}': {}", text, err);
                0.0
            }
        }
    }
}
