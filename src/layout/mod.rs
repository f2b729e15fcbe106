//! Text layout and pagination

mod engine;
pub mod font;
mod geometry;
mod line_break;
mod pagination;

pub use engine::{FitResult, LineLayout, MetricsLayoutEngine, TextLayoutEngine, TextMetrics};
pub use font::{FontLibrary, FontMetrics};
pub use geometry::PageGeometry;
pub use line_break::{LineBreaker, ParagraphSpan};
pub use pagination::{Page, PageFit, PaginationConfig, Paginator, DEFAULT_MAX_ITERATIONS};
