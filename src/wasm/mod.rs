//! WASM bindings for the paginated session

pub mod flat_buffer;

use crate::config::{EditorSettings, PageSetup};
use crate::document::{
    extract_outline, HeadingClassifier, JsonCodec, RichTextCodec, StyledDocument,
};
use crate::editing::Selection;
use crate::layout::MetricsLayoutEngine;
use crate::session::{DocumentId, PaginatedEditingSession};
use flat_buffer::RenderBuffer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WASM-exposed session wrapper
#[wasm_bindgen]
pub struct WasmSession {
    session: PaginatedEditingSession,
    settings: EditorSettings,
    buffer: RenderBuffer,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a session from settings JSON; `None` uses the defaults (US Letter, 72pt margins)
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<WasmSession, JsValue> {
        let settings = match settings_json {
            Some(json) => EditorSettings::from_json(&json).map_err(js_error)?,
            None => EditorSettings::default(),
        };
        Ok(Self::with_settings(settings))
    }

    /// Insert text at a character offset
    #[wasm_bindgen(js_name = insertText)]
    pub fn insert_text(&mut self, position: usize, text: &str) -> Result<(), JsValue> {
        self.session.insert(position, text).map_err(js_error)?;
        Ok(())
    }

    /// Delete the characters in `start..end`
    #[wasm_bindgen(js_name = deleteRange)]
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<(), JsValue> {
        self.session.delete(start..end).map_err(js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = replaceRange)]
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) -> Result<(), JsValue> {
        self.session.replace(start..end, text).map_err(js_error)?;
        Ok(())
    }

    /// Insert a new paragraph (Enter key)
    #[wasm_bindgen(js_name = insertParagraph)]
    pub fn insert_paragraph(&mut self) -> Result<(), JsValue> {
        let at = self.session.selection().active;
        self.insert_text(at, "\n")
    }

    #[wasm_bindgen(js_name = setCursor)]
    pub fn set_cursor(&mut self, offset: usize) {
        self.session.set_selection(Selection::collapsed(offset));
    }

    #[wasm_bindgen(js_name = setSelection)]
    pub fn set_selection(&mut self, anchor: usize, active: usize) {
        self.session.set_selection(Selection::new(anchor, active));
    }

    #[wasm_bindgen(js_name = getCursor)]
    pub fn get_cursor(&self) -> usize {
        self.session.selection().active
    }

    /// Replace paper and margins from page setup JSON
    #[wasm_bindgen(js_name = setPageSetup)]
    pub fn set_page_setup(&mut self, json: &str) -> Result<(), JsValue> {
        let page: PageSetup = serde_json::from_str(json).map_err(js_error)?;
        let mut settings = self.settings.clone();
        settings.page = page;
        settings.validate().map_err(js_error)?;
        self.settings = settings;
        self.session.set_geometry(page.geometry());
        Ok(())
    }

    /// Set page geometry directly in points
    #[wasm_bindgen(js_name = setGeometry)]
    pub fn set_geometry(
        &mut self,
        paper_width: f32,
        paper_height: f32,
        margin_top: f32,
        margin_bottom: f32,
        margin_left: f32,
        margin_right: f32,
    ) {
        self.session.set_geometry(crate::layout::PageGeometry {
            paper_width,
            paper_height,
            margin_top,
            margin_bottom,
            margin_left,
            margin_right,
        });
    }

    #[wasm_bindgen(js_name = getText)]
    pub fn get_text(&self) -> String {
        self.session.document().text()
    }

    #[wasm_bindgen(js_name = getVersion)]
    pub fn get_version(&self) -> u64 {
        self.session.document().version()
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.session.page_count()
    }

    #[wasm_bindgen(js_name = getCurrentPage)]
    pub fn get_current_page(&self) -> usize {
        self.session.current_page()
    }

    #[wasm_bindgen(js_name = goToPage)]
    pub fn go_to_page(&mut self, number: usize) {
        self.session.go_to_page(number);
    }

    #[wasm_bindgen(js_name = nextPage)]
    pub fn next_page(&mut self) {
        self.session.next_page();
    }

    #[wasm_bindgen(js_name = previousPage)]
    pub fn previous_page(&mut self) {
        self.session.previous_page();
    }

    /// Page the view should scroll to, if navigation asked for one
    #[wasm_bindgen(js_name = takeScrollRequest)]
    pub fn take_scroll_request(&mut self) -> Option<usize> {
        self.session.take_scroll_request()
    }

    #[wasm_bindgen(js_name = updateCurrentPageFromScroll)]
    pub fn update_current_page_from_scroll(&mut self, scroll_y: f32, page_height: f32) {
        self.session
            .update_current_page_from_scroll(scroll_y, page_height);
    }

    /// Page ranges and thumbnail state (returns JSON)
    #[wasm_bindgen(js_name = getPages)]
    pub fn get_pages(&self) -> String {
        let current = self.session.current_page();
        let pages: Vec<PageInfo> = self
            .session
            .pages()
            .iter()
            .map(|page| PageInfo {
                number: page.number,
                start: page.range.start,
                end: page.range.end,
                is_current: page.number == current,
            })
            .collect();
        serde_json::to_string(&pages).unwrap_or_default()
    }

    /// Heading outline (returns JSON)
    #[wasm_bindgen(js_name = getOutline)]
    pub fn get_outline(&self) -> String {
        let classifier = HeadingClassifier::new(self.settings.body.font_size);
        let outline: Vec<OutlineItem> = extract_outline(self.session.document(), &classifier)
            .into_iter()
            .map(|entry| OutlineItem {
                title: entry.title,
                level: entry.level,
                start: entry.range.start,
                end: entry.range.end,
            })
            .collect();
        serde_json::to_string(&outline).unwrap_or_default()
    }

    /// Render page `number` into the flat buffer; false for an unknown page
    #[wasm_bindgen(js_name = renderPage)]
    pub fn render_page(&mut self, number: usize) -> bool {
        let Some(rendered) = self.session.render_page(number, &self.settings.render) else {
            return false;
        };
        self.buffer
            .write_page(self.session.document().version(), &rendered);
        true
    }

    #[wasm_bindgen(js_name = u32Ptr)]
    pub fn u32_ptr(&self) -> u32 {
        self.buffer.u32_ptr()
    }

    #[wasm_bindgen(js_name = u32Len)]
    pub fn u32_len(&self) -> u32 {
        self.buffer.u32_len()
    }

    #[wasm_bindgen(js_name = f32Ptr)]
    pub fn f32_ptr(&self) -> u32 {
        self.buffer.f32_ptr()
    }

    #[wasm_bindgen(js_name = f32Len)]
    pub fn f32_len(&self) -> u32 {
        self.buffer.f32_len()
    }

    #[wasm_bindgen(js_name = textPtr)]
    pub fn text_ptr(&self) -> u32 {
        self.buffer.text_ptr()
    }

    #[wasm_bindgen(js_name = textLen)]
    pub fn text_len(&self) -> u32 {
        self.buffer.text_len()
    }

    /// Serialize the document with the JSON codec
    #[wasm_bindgen(js_name = saveJson)]
    pub fn save_json(&mut self) -> Result<Vec<u8>, JsValue> {
        let bytes = JsonCodec.encode(self.session.document()).map_err(js_error)?;
        self.session.flush_autosave();
        Ok(bytes)
    }

    /// Replace the document with one saved by `saveJson`
    #[wasm_bindgen(js_name = loadJson)]
    pub fn load_json(&mut self, id: u64, bytes: &[u8]) -> Result<(), JsValue> {
        let document = JsonCodec.decode(bytes).map_err(js_error)?;
        self.session.load_document(DocumentId(id), document);
        Ok(())
    }

    /// True once typing has paused long enough to save
    #[wasm_bindgen(js_name = pollAutosave)]
    pub fn poll_autosave(&mut self, now_ms: f64) -> bool {
        self.session.poll_autosave(now_ms as u64)
    }

    #[wasm_bindgen(js_name = hasUnsavedChanges)]
    pub fn has_unsaved_changes(&self) -> bool {
        self.session.has_unsaved_changes()
    }
}

impl WasmSession {
    pub fn with_settings(settings: EditorSettings) -> Self {
        let mut document = StyledDocument::new();
        document.apply_body_style(&settings.body);

        let mut session = PaginatedEditingSession::new(
            DocumentId::default(),
            document,
            Arc::new(MetricsLayoutEngine::default()),
            settings.session,
        );
        session.set_geometry(settings.page.geometry());

        Self {
            session,
            settings,
            buffer: RenderBuffer::new(),
        }
    }

    pub fn session(&self) -> &PaginatedEditingSession {
        &self.session
    }

    pub fn buffer(&self) -> &RenderBuffer {
        &self.buffer
    }
}

impl Default for WasmSession {
    fn default() -> Self {
        Self::with_settings(EditorSettings::default())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub number: usize,
    pub start: usize,
    pub end: usize,
    pub is_current: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineItem {
    pub title: String,
    pub level: u8,
    pub start: usize,
    pub end: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StyleChange;
    use flat_buffer::{HEADER_SIZE, MAGIC, OP_TEXT_RUN};

    #[test]
    fn test_typing_and_paging() {
        let mut wasm = WasmSession::default();
        wasm.insert_text(0, &"Some body text.\n".repeat(200)).unwrap();
        assert!(wasm.get_page_count() > 1);

        wasm.go_to_page(2);
        assert_eq!(wasm.get_current_page(), 2);
        assert_eq!(wasm.take_scroll_request(), Some(2));

        let pages: Vec<PageInfo> = serde_json::from_str(&wasm.get_pages()).unwrap();
        assert_eq!(pages.len(), wasm.get_page_count());
        assert!(pages[1].is_current);
        assert_eq!(pages[0].end, pages[1].start);
    }

    #[test]
    fn test_render_page_fills_buffer() {
        let mut wasm = WasmSession::default();
        wasm.insert_text(0, "Hello").unwrap();
        assert!(wasm.render_page(1));
        assert!(!wasm.render_page(5));

        let buf = wasm.buffer();
        assert_eq!(buf.u32_data[0], MAGIC);
        assert_eq!(buf.u32_data[4], 1);
        let has_text = (0..buf.u32_data[5] as usize)
            .any(|i| buf.u32_data[HEADER_SIZE + i * flat_buffer::U32_PER_ITEM] == OP_TEXT_RUN);
        assert!(has_text);
        assert!(buf.text_data.starts_with(b"Hello"));
    }

    #[test]
    fn test_outline_json() {
        let mut wasm = WasmSession::default();
        wasm.insert_text(0, "Title\nbody\n").unwrap();
        wasm.session
            .format(
                0..5,
                StyleChange {
                    size: Some(30.0),
                    bold: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let outline: Vec<OutlineItem> = serde_json::from_str(&wasm.get_outline()).unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title, "Title");
        assert_eq!(outline[0].level, 1);
    }

    #[test]
    fn test_save_and_load_json() {
        let mut wasm = WasmSession::default();
        wasm.insert_text(0, "keep me").unwrap();
        assert!(wasm.has_unsaved_changes());
        let bytes = wasm.save_json().unwrap();
        assert!(!wasm.has_unsaved_changes());

        let mut other = WasmSession::default();
        other.load_json(5, &bytes).unwrap();
        assert_eq!(other.get_text(), "keep me");
        assert_eq!(other.session().document_id(), DocumentId(5));
    }

    #[test]
    fn test_page_setup_json() {
        let mut wasm = WasmSession::default();
        wasm.insert_text(0, &"Some body text.\n".repeat(200)).unwrap();
        let letter = wasm.get_page_count();
        wasm.set_page_setup(
            r#"{"paper":"a5","margins":{"top":72,"bottom":72,"left":72,"right":72}}"#,
        )
        .unwrap();
        assert!(wasm.get_page_count() >= letter);
    }
}
