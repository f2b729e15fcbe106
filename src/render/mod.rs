//! Render output: page display lists and diff protocol

mod diff;
mod display;

pub use diff::{PageDiff, PagePatch};
pub use display::{
    DisplayItem, PageRenderer, RenderedPage, MARGIN_GUIDE_DASH, MIN_PAGE_NUMBER_INSET,
};
