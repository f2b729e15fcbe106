//! Paginated editing session
//!
//! Owns one document and keeps its page list current as edits arrive. Every edit
//! repaginates synchronously, reusing the pages the edit cannot have touched.

mod autosave;
mod events;

pub use autosave::{current_timestamp, SaveDebouncer, DEFAULT_DEBOUNCE_MS};
pub use events::{
    DocumentId, Observer, ObserverId, PaginationState, SessionEvent, SessionPhase, Thumbnail,
};

use crate::config::{BodyStyle, RenderOptions, SessionConfig};
use crate::document::{StyleChange, StyledDocument};
use crate::editing::{Affinity, EditKind, EditOp, EditResult, Selection};
use crate::error::EditError;
use crate::export::ExportSnapshot;
use crate::layout::{Page, PageFit, PageGeometry, Paginator, TextLayoutEngine};
use crate::render::{PageDiff, PageRenderer, RenderedPage};
use events::Observers;
use log::{debug, info};
use std::ops::Range;
use std::sync::Arc;

pub struct PaginatedEditingSession {
    id: DocumentId,
    document: StyledDocument,
    geometry: Option<PageGeometry>,
    engine: Arc<dyn TextLayoutEngine>,
    config: SessionConfig,
    pages: Vec<Page>,
    /// 1-based
    current_page: usize,
    selection: Selection,
    phase: SessionPhase,
    /// Edits not yet reflected in `pages`
    pending: Option<EditResult>,
    scroll_request: Option<usize>,
    observers: Observers,
    autosave: SaveDebouncer,
}

impl PaginatedEditingSession {
    pub fn new(
        id: DocumentId,
        document: StyledDocument,
        engine: Arc<dyn TextLayoutEngine>,
        config: SessionConfig,
    ) -> Self {
        let pages = placeholder_pages(&document);
        Self {
            id,
            document,
            geometry: None,
            engine,
            config,
            pages,
            current_page: 1,
            selection: Selection::default(),
            phase: SessionPhase::Uninitialized,
            pending: None,
            scroll_request: None,
            observers: Observers::default(),
            autosave: SaveDebouncer::new(config.autosave_debounce_ms),
        }
    }

    // ---- Document lifecycle ----

    /// Swap in another document
    pub fn load_document(&mut self, id: DocumentId, document: StyledDocument) {
        info!("loading document {} ({} chars)", id.0, document.len());
        self.id = id;
        self.document = document;
        self.pending = None;
        self.selection = Selection::collapsed(0);
        self.scroll_request = None;
        self.autosave = SaveDebouncer::new(self.config.autosave_debounce_ms);

        // Old pages stay until the new list is installed so the diff removes the extras
        self.observers.emit(&SessionEvent::DocumentLoaded { id });
        self.set_current_page(1);
        if self.geometry.is_some() {
            self.paginate();
        } else {
            let placeholder = placeholder_pages(&self.document);
            self.install_pages(placeholder);
            self.phase = SessionPhase::Uninitialized;
        }
    }

    /// Set the page geometry; repaginates fully when it changed
    pub fn set_geometry(&mut self, geometry: PageGeometry) {
        if self.geometry == Some(geometry) {
            return;
        }
        debug!(
            "geometry {}x{} content {}x{}",
            geometry.paper_width,
            geometry.paper_height,
            geometry.content_width(),
            geometry.content_height()
        );
        self.geometry = Some(geometry);
        self.paginate();
    }

    /// Restyle body text and repaginate
    pub fn set_body_style(&mut self, body: &BodyStyle) {
        self.document.apply_body_style(body);
        self.autosave.mark_dirty(current_timestamp());
        self.paginate();
    }

    // ---- Editing ----

    pub fn insert(&mut self, position: usize, text: &str) -> Result<EditResult, EditError> {
        self.apply_edit(EditOp::insert(position, text))
    }

    pub fn delete(&mut self, range: Range<usize>) -> Result<EditResult, EditError> {
        self.apply_edit(EditOp::delete(range.start, range.end))
    }

    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<EditResult, EditError> {
        self.apply_edit(EditOp::replace(range, text))
    }

    pub fn format(
        &mut self,
        range: Range<usize>,
        change: StyleChange,
    ) -> Result<EditResult, EditError> {
        self.apply_edit(EditOp::format(range, change))
    }

    /// Apply an edit, move the cursor and bring the pages up to date
    pub fn apply_edit(&mut self, op: EditOp) -> Result<EditResult, EditError> {
        let result = self.document.apply_edit(op)?;

        self.pending = Some(match self.pending.take() {
            Some(earlier) => earlier.merge(result.clone()),
            None => result.clone(),
        });
        self.selection = Selection::collapsed(result.new_cursor);
        self.autosave.mark_dirty(current_timestamp());

        self.ensure_pages();
        self.follow_selection();
        Ok(result)
    }

    // ---- Pagination ----

    /// Full pagination pass
    pub fn paginate(&mut self) {
        self.pending = None;
        let Some(geometry) = self.geometry else {
            let placeholder = placeholder_pages(&self.document);
            self.install_pages(placeholder);
            return;
        };

        self.phase = SessionPhase::Paginating;
        let pages = Paginator::new(self.engine.as_ref(), self.config.pagination)
            .paginate(&self.document, &geometry);
        debug!("paginated {} chars into {} pages", self.document.len(), pages.len());
        self.install_pages(pages);
    }

    /// Reflect pending edits in the page list
    pub fn ensure_pages(&mut self) {
        let Some(edit) = self.pending.take() else {
            return;
        };
        let Some(geometry) = self.geometry else {
            let placeholder = placeholder_pages(&self.document);
            self.install_pages(placeholder);
            return;
        };
        if self.phase == SessionPhase::Uninitialized || !geometry.has_content_box() {
            self.paginate();
            return;
        }

        self.phase = SessionPhase::Paginating;
        let pages = self.reflow(&edit, &geometry);
        self.install_pages(pages);
    }

    /// Rebuild pages from one page before the edit, splicing back the untouched tail
    fn reflow(&self, edit: &EditResult, geometry: &PageGeometry) -> Vec<Page> {
        let doc = &self.document;
        let old = &self.pages;
        let paginator = Paginator::new(self.engine.as_ref(), self.config.pagination);
        let len = doc.len();

        let anchor = match edit.kind {
            EditKind::Text => edit.start,
            EditKind::Format => doc.paragraph_range(edit.start).start,
        };
        let affected = old
            .partition_point(|page| page.range.end <= anchor)
            .min(old.len().saturating_sub(1));
        let restart = affected.saturating_sub(1);

        let mut pages: Vec<Page> = old[..restart].to_vec();
        let mut cursor = old.get(restart).map_or(0, |page| page.range.start);
        let mut refitted = 0;

        while cursor < len {
            if let Some(reused) = self.reusable_tail(edit, cursor, pages.len()) {
                let delta = edit.delta();
                for page in &old[reused..] {
                    let number = pages.len() + 1;
                    pages.push(page.relocated(delta, number));
                }
                debug!(
                    "reflow of {}..{} rejoined old page {} after {} pages",
                    edit.start,
                    edit.new_end,
                    reused + 1,
                    refitted
                );
                break;
            }
            // Kept pages count against the cap exactly as in a full pass
            if pages.len() >= self.config.pagination.max_iterations {
                paginator.paginate_from(doc, geometry, cursor, &mut pages);
                break;
            }
            refitted += 1;

            match paginator.fit_page(doc, cursor, geometry, pages.len() + 1) {
                PageFit::Fitted(page) => {
                    cursor = page.range.end;
                    pages.push(page);
                }
                // Let the full pass log and degrade
                PageFit::Stalled | PageFit::Failed(_) => {
                    paginator.paginate_from(doc, geometry, cursor, &mut pages);
                    break;
                }
            }
        }

        self.verify_tail(&paginator, geometry, &mut pages);
        pages
    }

    /// Index of an old page that starts at `cursor` once shifted and can be reused as is
    ///
    /// The page's paragraph must begin after the edited region, so the text it was
    /// laid out from is unchanged apart from its position. The spliced list must also
    /// stay within the iteration cap; past it a full pass ends in an overflow page.
    fn reusable_tail(&self, edit: &EditResult, cursor: usize, kept: usize) -> Option<usize> {
        if self.document.paragraph_range(cursor).start <= edit.new_end {
            return None;
        }
        let old_offset = usize::try_from(cursor as isize - edit.delta()).ok()?;
        if old_offset < edit.old_end {
            return None;
        }
        let index = self
            .pages
            .partition_point(|page| page.range.start < old_offset);
        let page = self.pages.get(index)?;
        // An old list longer than the cap ends in an overflow page
        let cap = self.config.pagination.max_iterations;
        let within_cap = self.pages.len() <= cap && kept + (self.pages.len() - index) <= cap;
        (page.range.start == old_offset && !page.is_empty() && within_cap).then_some(index)
    }

    /// The last page must end the document and no trailing page may be empty
    fn verify_tail(
        &self,
        paginator: &Paginator<'_>,
        geometry: &PageGeometry,
        pages: &mut Vec<Page>,
    ) {
        let len = self.document.len();
        let covered = pages.last().map_or(0, |page| page.range.end);
        if covered < len {
            paginator.paginate_from(&self.document, geometry, covered, pages);
        }
        while pages.len() > 1 && pages.last().is_some_and(Page::is_empty) {
            pages.pop();
        }
        if pages.is_empty() {
            pages.push(Page::empty(1, &self.document));
        }
    }

    /// Replace the page list and tell observers what changed
    fn install_pages(&mut self, pages: Vec<Page>) {
        let diff = PageDiff::between(&self.pages, &pages, self.document.version());
        self.pages = pages;
        if self.geometry.is_some() {
            self.phase = SessionPhase::Stable;
        }
        if diff.has_patches() {
            self.observers.emit(&SessionEvent::PagesChanged(diff));
        }
        self.set_current_page(self.current_page);
    }

    // ---- Selection and navigation ----

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Move the selection; the current page follows its active end
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamped(self.document.len());
        self.follow_selection();
    }

    fn follow_selection(&mut self) {
        let active = self.selection.active;
        let mut page = self.page_for_offset(active);
        // Upstream affinity keeps a boundary cursor on the earlier page
        if self.selection.affinity == Affinity::Upstream
            && page > 1
            && self.pages[page - 1].range.start == active
        {
            page -= 1;
        }
        self.set_current_page(page);
    }

    /// Derive the current page from the scroll position
    pub fn update_current_page_from_scroll(&mut self, scroll_y: f32, page_height: f32) {
        let stride = page_height + self.config.page_spacing;
        let page = if stride > 0.0 && scroll_y.is_finite() {
            (scroll_y.max(0.0) / stride).floor() as usize + 1
        } else {
            1
        };
        self.set_current_page(page);
    }

    /// Jump to page `number`, clamped, and ask the view to scroll there
    pub fn go_to_page(&mut self, number: usize) {
        self.set_current_page(number);
        let page = self.current_page;
        self.scroll_request = Some(page);
        self.observers.emit(&SessionEvent::ScrollRequested { page });
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page + 1);
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.current_page.saturating_sub(1));
    }

    /// Pending scroll target, cleared on read
    pub fn take_scroll_request(&mut self) -> Option<usize> {
        self.scroll_request.take()
    }

    fn set_current_page(&mut self, page: usize) {
        let page = page.clamp(1, self.pages.len().max(1));
        if page != self.current_page {
            self.current_page = page;
            self.observers
                .emit(&SessionEvent::CurrentPageChanged { page });
        }
    }

    // ---- Queries ----

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page by 1-based number
    pub fn page(&self, number: usize) -> Option<&Page> {
        number.checked_sub(1).and_then(|idx| self.pages.get(idx))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Page holding `offset`; a boundary offset belongs to the page starting there
    pub fn page_for_offset(&self, offset: usize) -> usize {
        let idx = self.pages.partition_point(|page| page.range.end <= offset);
        idx.min(self.pages.len().saturating_sub(1)) + 1
    }

    pub fn state(&self) -> PaginationState {
        PaginationState {
            pages: self.pages.clone(),
            current_page: self.current_page,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn document(&self) -> &StyledDocument {
        &self.document
    }

    pub fn document_id(&self) -> DocumentId {
        self.id
    }

    pub fn geometry(&self) -> Option<&PageGeometry> {
        self.geometry.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn thumbnails(&self) -> Vec<Thumbnail> {
        self.pages
            .iter()
            .map(|page| Thumbnail {
                number: page.number,
                is_current: page.number == self.current_page,
            })
            .collect()
    }

    /// Display list for page `number`; `None` without geometry or for an unknown page
    pub fn render_page(&self, number: usize, options: &RenderOptions) -> Option<RenderedPage> {
        let geometry = self.geometry.as_ref()?;
        let page = self.page(number)?;
        Some(PageRenderer::new(self.engine.as_ref(), *options).render(page, geometry))
    }

    /// Owned copy of everything an export worker needs
    pub fn export_snapshot(&self) -> Option<ExportSnapshot> {
        Some(ExportSnapshot {
            document: self.document.clone(),
            geometry: self.geometry?,
            engine: Arc::clone(&self.engine),
            pagination: self.config.pagination,
        })
    }

    // ---- Observers and autosave ----

    pub fn subscribe(&mut self, observer: Observer) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// True exactly once per quiet period after edits; the host saves then
    pub fn poll_autosave(&mut self, now_ms: u64) -> bool {
        self.autosave.poll(now_ms)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.autosave.is_dirty()
    }

    /// Clear pending changes after an explicit save; true if there were any
    pub fn flush_autosave(&mut self) -> bool {
        self.autosave.flush()
    }
}

impl std::fmt::Debug for PaginatedEditingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedEditingSession")
            .field("id", &self.id)
            .field("len", &self.document.len())
            .field("pages", &self.pages.len())
            .field("current_page", &self.current_page)
            .field("phase", &self.phase)
            .finish()
    }
}

/// One unlaid page covering the whole document
fn placeholder_pages(doc: &StyledDocument) -> Vec<Page> {
    if doc.is_empty() {
        return vec![Page::empty(1, doc)];
    }
    vec![Page {
        number: 1,
        range: 0..doc.len(),
        content: doc.substring(0..doc.len()),
        lines: Vec::new(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Margins, PageSetup, PaperSize};
    use crate::document::{Alignment, FontDescriptor, ParagraphStyle, StyleAttributes};
    use crate::layout::{MetricsLayoutEngine, PaginationConfig};
    use crate::render::PagePatch;
    use std::cell::RefCell;
    use std::rc::Rc;

    // Content box 40x30 with a 10pt monospace font: 8 chars per line, 3 lines per page
    fn geometry() -> PageGeometry {
        PageGeometry::with_uniform_margins(60.0, 50.0, 10.0)
    }

    fn attrs() -> StyleAttributes {
        StyleAttributes::new(FontDescriptor::new("Mono", 10.0), ParagraphStyle::default())
    }

    fn mono_session(text: &str) -> PaginatedEditingSession {
        let mut session = PaginatedEditingSession::new(
            DocumentId(1),
            StyledDocument::from_plain_text(text, attrs()),
            Arc::new(MetricsLayoutEngine::monospace(0.5)),
            SessionConfig::default(),
        );
        session.set_geometry(geometry());
        session
    }

    fn full_pass(session: &PaginatedEditingSession) -> Vec<Page> {
        let engine = MetricsLayoutEngine::monospace(0.5);
        Paginator::new(&engine, PaginationConfig::default())
            .paginate(session.document(), session.geometry().unwrap())
    }

    fn ranges(pages: &[Page]) -> Vec<Range<usize>> {
        pages.iter().map(|p| p.range.clone()).collect()
    }

    fn assert_coverage(session: &PaginatedEditingSession) {
        let mut expected = 0;
        for (idx, page) in session.pages().iter().enumerate() {
            assert_eq!(page.number, idx + 1);
            assert_eq!(page.range.start, expected);
            expected = page.range.end;
        }
        assert_eq!(expected, session.document().len());
        assert!((1..=session.page_count()).contains(&session.current_page()));
    }

    fn record(session: &mut PaginatedEditingSession) -> Rc<RefCell<Vec<SessionEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.subscribe(Box::new(move |event| sink.borrow_mut().push(event.clone())));
        events
    }

    #[test]
    fn test_uninitialized_until_geometry() {
        let mut session = PaginatedEditingSession::new(
            DocumentId(3),
            StyledDocument::from_plain_text("hello", attrs()),
            Arc::new(MetricsLayoutEngine::monospace(0.5)),
            SessionConfig::default(),
        );
        assert_eq!(session.phase(), SessionPhase::Uninitialized);
        assert_eq!(ranges(session.pages()), vec![0..5]);
        assert!(session.render_page(1, &RenderOptions::default()).is_none());
        assert!(session.export_snapshot().is_none());

        session.insert(5, " world").unwrap();
        assert_eq!(ranges(session.pages()), vec![0..11]);

        session.set_geometry(geometry());
        assert_eq!(session.phase(), SessionPhase::Stable);
        assert_eq!(session.pages(), full_pass(&session).as_slice());
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let session = mono_session("");
        assert_eq!(session.page_count(), 1);
        assert_eq!(session.pages()[0].range, 0..0);
        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn test_exact_fill_then_new_paragraph() {
        let mut session = mono_session("aaa\nbbb\nccc");
        assert_eq!(session.page_count(), 1);

        let end = session.document().len();
        session.insert(end, "\nddd").unwrap();
        assert_eq!(ranges(session.pages()), vec![0..12, 12..15]);
        assert_eq!(session.pages()[1].content.text(), "ddd");
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn test_deleting_last_page_text_trims_it() {
        let mut session = mono_session("aaa\nbbb\nccc\nddd\neee\nfff\nggg");
        assert_eq!(session.page_count(), 3);
        session.go_to_page(3);
        assert_eq!(session.current_page(), 3);

        session.delete(24..27).unwrap();
        assert_eq!(ranges(session.pages()), vec![0..12, 12..24]);
        assert_eq!(session.current_page(), 2);
        assert_coverage(&session);
    }

    #[test]
    fn test_incremental_matches_full_pass() {
        let paragraph = "the quick brown fox jumps over the lazy dog\n";
        let mut session = mono_session(&paragraph.repeat(12));
        assert_eq!(session.pages(), full_pass(&session).as_slice());

        let mut seed: u64 = 0x2545_f491;
        let mut next = |bound: usize| {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            ((seed >> 33) as usize) % bound.max(1)
        };

        for step in 0..60 {
            let len = session.document().len();
            let at = next(len + 1);
            match step % 5 {
                0 => session.insert(at, "lorem ").map(|_| ()),
                1 => session.insert(at, "\n").map(|_| ()),
                2 => {
                    let end = (at + 1 + next(12)).min(len);
                    session.delete(at.min(end)..end).map(|_| ())
                }
                3 => {
                    let end = (at + next(30)).min(len);
                    session
                        .format(
                            at.min(end)..end,
                            StyleChange {
                                bold: Some(step % 2 == 0),
                                ..Default::default()
                            },
                        )
                        .map(|_| ())
                }
                _ => {
                    let end = (at + 1).min(len);
                    session
                        .format(
                            at.min(end)..end,
                            StyleChange {
                                spacing_before: Some(next(3) as f32 * 4.0),
                                alignment: Some(Alignment::Center),
                                ..Default::default()
                            },
                        )
                        .map(|_| ())
                }
            }
            .unwrap();

            assert_eq!(
                session.pages(),
                full_pass(&session).as_slice(),
                "pages diverged after step {}",
                step
            );
            assert_coverage(&session);
        }
    }

    #[test]
    fn test_incremental_matches_full_pass_under_iteration_cap() {
        for cap in [3, 5] {
            let pagination = PaginationConfig { max_iterations: cap };
            let mut session = PaginatedEditingSession::new(
                DocumentId(1),
                StyledDocument::from_plain_text(&"aaa\n".repeat(18), attrs()),
                Arc::new(MetricsLayoutEngine::monospace(0.5)),
                SessionConfig {
                    pagination,
                    ..SessionConfig::default()
                },
            );
            session.set_geometry(geometry());
            let capped_pass = |session: &PaginatedEditingSession| {
                let engine = MetricsLayoutEngine::monospace(0.5);
                Paginator::new(&engine, pagination)
                    .paginate(session.document(), session.geometry().unwrap())
            };
            assert_eq!(session.page_count(), cap + 1);
            assert_eq!(session.pages(), capped_pass(&session).as_slice());

            let end = session.document().len();
            session.insert(end, "x").unwrap();
            assert_eq!(session.pages(), capped_pass(&session).as_slice());
            assert_eq!(session.page_count(), cap + 1);

            session.insert(0, "bb\n").unwrap();
            assert_eq!(session.pages(), capped_pass(&session).as_slice());

            session.delete(10..14).unwrap();
            assert_eq!(session.pages(), capped_pass(&session).as_slice());

            session.insert(30, "\n").unwrap();
            assert_eq!(session.pages(), capped_pass(&session).as_slice());

            let end = session.document().len();
            session.delete(20..end).unwrap();
            assert_eq!(session.pages(), capped_pass(&session).as_slice());
            assert_coverage(&session);
        }
    }

    #[test]
    fn test_typing_at_end_reuses_earlier_pages() {
        let mut session = mono_session(&"word word\n".repeat(20));
        let events = record(&mut session);
        let end = session.document().len();
        session.insert(end, "x").unwrap();

        let events = events.borrow();
        let diff = events
            .iter()
            .find_map(|event| match event {
                SessionEvent::PagesChanged(diff) => Some(diff.clone()),
                _ => None,
            })
            .unwrap();
        // Only the tail page changed
        assert!(diff.patches.len() <= 2);
        assert_eq!(diff.page_count, session.page_count());
    }

    #[test]
    fn test_long_document_is_stable() {
        let mut session = PaginatedEditingSession::new(
            DocumentId(7),
            StyledDocument::new(),
            Arc::new(MetricsLayoutEngine::default()),
            SessionConfig::default(),
        );
        session.set_geometry(PageSetup::default().geometry());
        session.set_body_style(&BodyStyle {
            font_size: 16.0,
            line_spacing: 1.5,
            ..BodyStyle::default()
        });

        let sentence = "Pagination should not wobble between identical passes. ";
        let mut text = sentence.repeat(10_000 / sentence.len() + 1);
        text.truncate(10_000);
        session.insert(0, &text).unwrap();
        assert_eq!(session.document().len(), 10_000);

        let count = session.page_count();
        assert!(count > 1);
        for _ in 0..3 {
            session.paginate();
            assert_eq!(session.page_count(), count);
        }
        assert_coverage(&session);
    }

    #[test]
    fn test_smaller_paper_never_reduces_pages() {
        let mut session = mono_session("");
        session.set_geometry(PageSetup::default().geometry());
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit.\n".repeat(200);
        session.insert(0, &text).unwrap();
        let letter = session.page_count();

        session.set_geometry(
            PageSetup {
                paper: PaperSize::A5,
                margins: Margins::uniform(72.0),
            }
            .geometry(),
        );
        assert!(session.page_count() >= letter);
        assert_coverage(&session);
    }

    #[test]
    fn test_cursor_on_boundary_and_at_end() {
        let mut session = mono_session("aaa\nbbb\nccc\nddd\neee\nfff\nggg");
        session.set_selection(Selection::collapsed(12));
        assert_eq!(session.current_page(), 2);

        session.set_selection(Selection::collapsed(12).with_affinity(Affinity::Upstream));
        assert_eq!(session.current_page(), 1);

        session.set_selection(Selection::collapsed(session.document().len()));
        assert_eq!(session.current_page(), 3);

        session.set_selection(Selection::collapsed(500));
        assert_eq!(session.selection().active, session.document().len());
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut session = mono_session("aaa\nbbb\nccc\nddd\neee\nfff\nggg");
        let events = record(&mut session);

        session.go_to_page(99);
        assert_eq!(session.current_page(), 3);
        assert_eq!(session.take_scroll_request(), Some(3));
        assert_eq!(session.take_scroll_request(), None);

        session.next_page();
        assert_eq!(session.current_page(), 3);
        session.previous_page();
        session.previous_page();
        session.previous_page();
        assert_eq!(session.current_page(), 1);
        session.go_to_page(0);
        assert_eq!(session.current_page(), 1);

        assert!(events
            .borrow()
            .contains(&SessionEvent::ScrollRequested { page: 3 }));
        assert!(events
            .borrow()
            .contains(&SessionEvent::CurrentPageChanged { page: 2 }));
    }

    #[test]
    fn test_scroll_maps_to_page() {
        let mut session = mono_session("aaa\nbbb\nccc\nddd\neee\nfff\nggg");
        // 50pt pages with the default 48pt gap
        session.update_current_page_from_scroll(0.0, 50.0);
        assert_eq!(session.current_page(), 1);
        session.update_current_page_from_scroll(98.0, 50.0);
        assert_eq!(session.current_page(), 2);
        session.update_current_page_from_scroll(10_000.0, 50.0);
        assert_eq!(session.current_page(), 3);
        session.update_current_page_from_scroll(f32::NAN, 50.0);
        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn test_load_document_resets() {
        let mut session = mono_session("aaa\nbbb\nccc\nddd\neee\nfff\nggg");
        session.go_to_page(3);
        let events = record(&mut session);

        session.load_document(DocumentId(9), StyledDocument::from_plain_text("new", attrs()));
        assert_eq!(session.document_id(), DocumentId(9));
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.selection(), Selection::collapsed(0));
        assert_eq!(ranges(session.pages()), vec![0..3]);
        assert_eq!(
            events.borrow().first(),
            Some(&SessionEvent::DocumentLoaded { id: DocumentId(9) })
        );

        let events = events.borrow();
        let diff = events
            .iter()
            .find_map(|event| match event {
                SessionEvent::PagesChanged(diff) => Some(diff.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(diff.page_count, 1);
        assert_eq!(
            diff.patches.as_slice(),
            &[
                PagePatch::RemovePage { index: 1 },
                PagePatch::RemovePage { index: 2 },
                PagePatch::UpdatePage { index: 0 },
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_events() {
        let mut session = mono_session("abc");
        let events = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&events);
        let id = session.subscribe(Box::new(move |_| *sink.borrow_mut() += 1));
        session.insert(0, "x").unwrap();
        let seen = *events.borrow();
        assert!(seen > 0);

        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session.insert(0, "y").unwrap();
        assert_eq!(*events.borrow(), seen);
        assert_eq!(session.observer_count(), 0);
    }

    #[test]
    fn test_geometry_unchanged_is_noop() {
        let mut session = mono_session("abc");
        let events = record(&mut session);
        session.set_geometry(geometry());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_failed_edit_leaves_pages() {
        let mut session = mono_session("abc");
        let before = session.state();
        assert!(session.insert(10, "x").is_err());
        assert_eq!(session.state(), before);
    }

    #[test]
    fn test_thumbnails_and_render() {
        let mut session = mono_session("aaa\nbbb\nccc\nddd");
        session.go_to_page(2);
        let thumbs = session.thumbnails();
        assert_eq!(thumbs.len(), 2);
        assert!(!thumbs[0].is_current);
        assert!(thumbs[1].is_current);

        let rendered = session.render_page(2, &RenderOptions::default()).unwrap();
        assert_eq!(rendered.number, 2);
        assert_eq!(rendered.text_runs().collect::<Vec<_>>(), vec!["ddd"]);
        assert!(session.render_page(3, &RenderOptions::default()).is_none());
    }

    #[test]
    fn test_autosave_after_edits() {
        let mut session = mono_session("abc");
        assert!(!session.has_unsaved_changes());
        session.insert(3, "d").unwrap();
        assert!(session.has_unsaved_changes());

        let now = current_timestamp();
        assert!(!session.poll_autosave(now.saturating_sub(10_000)));
        assert!(session.poll_autosave(now + DEFAULT_DEBOUNCE_MS + 1));
        assert!(!session.poll_autosave(now + 2 * DEFAULT_DEBOUNCE_MS + 1));

        // An explicit save cancels the pending autosave
        session.insert(0, "e").unwrap();
        assert!(session.flush_autosave());
        assert!(!session.has_unsaved_changes());
        assert!(!session.flush_autosave());
        assert!(!session.poll_autosave(current_timestamp() + DEFAULT_DEBOUNCE_MS + 1));
    }
}
