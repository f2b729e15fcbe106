//! Whole-document export pass
//!
//! Paginates a document and renders every page to a display list. Export runs the
//! same paginator and renderer as the on-screen preview, so what prints matches what
//! was shown.

use crate::config::RenderOptions;
use crate::document::StyledDocument;
use crate::layout::{Page, PageGeometry, PaginationConfig, Paginator, TextLayoutEngine};
use crate::render::{PageRenderer, RenderedPage};
use log::info;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Owned inputs for an export on another thread
#[derive(Clone)]
pub struct ExportSnapshot {
    pub document: StyledDocument,
    pub geometry: PageGeometry,
    pub engine: Arc<dyn TextLayoutEngine>,
    pub pagination: PaginationConfig,
}

impl std::fmt::Debug for ExportSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportSnapshot")
            .field("len", &self.document.len())
            .field("geometry", &self.geometry)
            .field("pagination", &self.pagination)
            .finish()
    }
}

impl ExportSnapshot {
    pub fn render(&self, options: &RenderOptions) -> Vec<RenderedPage> {
        render_document(
            &self.document,
            &self.geometry,
            self.engine.as_ref(),
            options,
            &self.pagination,
        )
    }
}

/// Paginate `document` and render every page
pub fn render_document(
    document: &StyledDocument,
    geometry: &PageGeometry,
    engine: &dyn TextLayoutEngine,
    options: &RenderOptions,
    config: &PaginationConfig,
) -> Vec<RenderedPage> {
    let pages = Paginator::new(engine, *config).paginate(document, geometry);
    info!("exporting {} pages", pages.len());
    render_pages(&pages, geometry, &PageRenderer::new(engine, *options))
}

#[cfg(feature = "parallel-export")]
fn render_pages(
    pages: &[Page],
    geometry: &PageGeometry,
    renderer: &PageRenderer<'_>,
) -> Vec<RenderedPage> {
    use rayon::prelude::*;

    pages
        .par_iter()
        .map(|page| renderer.render(page, geometry))
        .collect()
}

#[cfg(not(feature = "parallel-export"))]
fn render_pages(
    pages: &[Page],
    geometry: &PageGeometry,
    renderer: &PageRenderer<'_>,
) -> Vec<RenderedPage> {
    pages
        .iter()
        .map(|page| renderer.render(page, geometry))
        .collect()
}

/// Run the export pass on a worker thread
pub fn spawn_export(
    snapshot: ExportSnapshot,
    options: RenderOptions,
) -> JoinHandle<Vec<RenderedPage>> {
    thread::spawn(move || snapshot.render(&options))
}
