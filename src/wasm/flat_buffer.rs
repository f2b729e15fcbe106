//! Flat buffer protocol for zero-copy WASM bridge
//!
//! One rendered page per buffer.
//!
//! ## u32 Buffer Layout:
//! ```text
//! Header:
//! [0]     MAGIC (0x464F4C4F = "FOLO" for validation)
//! [1]     SCHEMA_VERSION (protocol version, currently 1)
//! [2]     version_lo (document version)
//! [3]     version_hi (document version)
//! [4]     page_number
//! [5]     item_count
//! [6]     text_buffer_len
//! [7]     font_count
//! [8]     u32_font_table_offset (index in u32_data where the font table starts)
//! [9..]   items...
//!
//! Per-item: [opcode, text_offset, text_len, text_utf16_offset, text_utf16_len, font_id, flags]
//!   text_*: only meaningful for TEXT_RUN and PAGE_NUMBER, zero otherwise
//!   font_id: index into the font table, NO_FONT when the item carries no family
//!   flags: bit0=bold, bit1=italic
//!
//! At u32_font_table_offset (font_count times):
//!   [family_offset, family_len, family_utf16_offset, family_utf16_len]
//! ```
//!
//! ## f32 Buffer Layout:
//! ```text
//! [0..2]  page size: [width, height]
//! Per-item: [x, y, width, height, font_size, dash_on, dash_off]
//!   text items: (x, y) is the baseline start, height is zero
//! ```

use crate::render::{DisplayItem, RenderedPage};
use rustc_hash::FxHashMap;

/// Magic number for format validation: "FOLO"
pub const MAGIC: u32 = 0x464F4C4F;

/// Schema version for protocol compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Header size in u32 elements
pub const HEADER_SIZE: usize = 9;

/// f32 values before the first item
pub const F32_HEADER_SIZE: usize = 2;

/// Opcodes for display items
pub const OP_BACKGROUND: u32 = 0;
pub const OP_MARGIN_GUIDE: u32 = 1;
pub const OP_CLIP: u32 = 2;
pub const OP_TEXT_RUN: u32 = 3;
pub const OP_PAGE_NUMBER: u32 = 4;

/// Flags bitmask
pub const FLAG_BOLD: u32 = 0b0001;
pub const FLAG_ITALIC: u32 = 0b0010;

/// Font id for items without a family
pub const NO_FONT: u32 = u32::MAX;

/// Number of u32 values per item
pub const U32_PER_ITEM: usize = 7;

/// Number of f32 values per item
pub const F32_PER_ITEM: usize = 7;

/// Number of u32 values per font table entry
pub const U32_PER_FONT: usize = 4;

/// Render buffer for zero-copy WASM transfer
pub struct RenderBuffer {
    /// Integer data (opcodes, offsets, ids)
    pub u32_data: Vec<u32>,
    /// Float data (positions, dimensions)
    pub f32_data: Vec<f32>,
    /// UTF-8 text buffer
    pub text_data: Vec<u8>,

    // Font families in first-use order, written in finalize()
    fonts: Vec<String>,
    font_ids: FxHashMap<String, u32>,

    item_count: u32,

    // Track cumulative UTF-16 offset for efficient JS decoding
    utf16_text_offset: usize,
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self {
            u32_data: Vec::with_capacity(1024),
            f32_data: Vec::with_capacity(1024),
            text_data: Vec::with_capacity(4096),
            fonts: Vec::new(),
            font_ids: FxHashMap::default(),
            item_count: 0,
            utf16_text_offset: 0,
        }
    }

    pub fn clear(&mut self) {
        self.u32_data.clear();
        self.f32_data.clear();
        self.text_data.clear();
        self.fonts.clear();
        self.font_ids.clear();
        self.item_count = 0;
        self.utf16_text_offset = 0;
    }

    /// Pre-allocate buffers to avoid reallocation during rendering.
    /// JS holds pointers to these buffers, so a realloc would leave it with dangling views.
    pub fn prepare(&mut self, item_count: usize, text_needed: usize) {
        let u32_target = HEADER_SIZE + item_count * U32_PER_ITEM + 8 * U32_PER_FONT + 32;
        let f32_target = F32_HEADER_SIZE + item_count * F32_PER_ITEM + 32;
        let text_target = text_needed + 256;

        // Reuse buffers if capacity is sufficient
        if self.u32_data.capacity() < u32_target {
            self.u32_data = Vec::with_capacity(u32_target);
        }
        if self.f32_data.capacity() < f32_target {
            self.f32_data = Vec::with_capacity(f32_target);
        }
        if self.text_data.capacity() < text_target {
            self.text_data = Vec::with_capacity(text_target);
        }
        self.clear();
    }

    /// Serialize a whole rendered page
    pub fn write_page(&mut self, version: u64, page: &RenderedPage) {
        let text_needed = page
            .items
            .iter()
            .map(|item| match item {
                DisplayItem::TextRun { text, font, .. } => text.len() + font.family.len(),
                DisplayItem::PageNumber { text, .. } => text.len(),
                _ => 0,
            })
            .sum();
        self.prepare(page.items.len(), text_needed);

        self.write_header(version, page.number as u32);
        self.f32_data.push(page.size.width);
        self.f32_data.push(page.size.height);
        for item in &page.items {
            self.write_item(item);
        }
        self.finalize();
    }

    /// Write header; counts and offsets are filled in by finalize()
    pub fn write_header(&mut self, version: u64, page_number: u32) {
        self.u32_data.push(MAGIC); // [0] magic number
        self.u32_data.push(SCHEMA_VERSION); // [1] schema version
        self.u32_data.push((version & 0xFFFF_FFFF) as u32); // [2] version_lo
        self.u32_data.push((version >> 32) as u32); // [3] version_hi
        self.u32_data.push(page_number); // [4] page number
        self.u32_data.push(0); // [5] item_count (placeholder)
        self.u32_data.push(0); // [6] text_buffer_len (placeholder)
        self.u32_data.push(0); // [7] font_count (placeholder)
        self.u32_data.push(0); // [8] u32_font_table_offset (placeholder)
    }

    pub fn write_item(&mut self, item: &DisplayItem) {
        match item {
            DisplayItem::Background { rect } => {
                self.push_item(OP_BACKGROUND, None, NO_FONT, 0);
                self.push_geometry([rect.x, rect.y, rect.width, rect.height, 0.0, 0.0, 0.0]);
            }
            DisplayItem::MarginGuide { rect, dash } => {
                self.push_item(OP_MARGIN_GUIDE, None, NO_FONT, 0);
                self.push_geometry([
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    0.0,
                    dash[0],
                    dash[1],
                ]);
            }
            DisplayItem::Clip { rect } => {
                self.push_item(OP_CLIP, None, NO_FONT, 0);
                self.push_geometry([rect.x, rect.y, rect.width, rect.height, 0.0, 0.0, 0.0]);
            }
            DisplayItem::TextRun {
                position,
                text,
                font,
                width,
            } => {
                let font_id = self.font_id(&font.family);
                let mut flags = 0;
                if font.bold {
                    flags |= FLAG_BOLD;
                }
                if font.italic {
                    flags |= FLAG_ITALIC;
                }
                self.push_item(OP_TEXT_RUN, Some(text), font_id, flags);
                self.push_geometry([position.x, position.y, *width, 0.0, font.size, 0.0, 0.0]);
            }
            DisplayItem::PageNumber {
                position,
                text,
                font_size,
            } => {
                self.push_item(OP_PAGE_NUMBER, Some(text), NO_FONT, 0);
                self.push_geometry([position.x, position.y, 0.0, 0.0, *font_size, 0.0, 0.0]);
            }
        }
    }

    /// Append text and return (offset, len, utf16_offset, utf16_len)
    fn push_text(&mut self, text: &str) -> [u32; 4] {
        let offset = self.text_data.len() as u32;
        self.text_data.extend_from_slice(text.as_bytes());
        let utf16_offset = self.utf16_text_offset as u32;
        let utf16_len = text.chars().map(|c| c.len_utf16()).sum::<usize>();
        self.utf16_text_offset += utf16_len;

        debug_assert!(
            (offset as u64) + (text.len() as u64) <= u32::MAX as u64,
            "Text offset + length overflow: {} + {} > u32::MAX",
            offset,
            text.len()
        );
        [offset, text.len() as u32, utf16_offset, utf16_len as u32]
    }

    fn push_item(&mut self, opcode: u32, text: Option<&str>, font_id: u32, flags: u32) {
        let text_ref = text.map_or([0; 4], |text| self.push_text(text));
        self.u32_data.push(opcode);
        self.u32_data.extend_from_slice(&text_ref);
        self.u32_data.push(font_id);
        self.u32_data.push(flags);
        self.item_count += 1;
    }

    fn push_geometry(&mut self, values: [f32; F32_PER_ITEM]) {
        self.f32_data.extend_from_slice(&values);
    }

    fn font_id(&mut self, family: &str) -> u32 {
        if let Some(&id) = self.font_ids.get(family) {
            return id;
        }
        let id = self.fonts.len() as u32;
        self.fonts.push(family.to_string());
        self.font_ids.insert(family.to_string(), id);
        id
    }

    /// Write the font table and synchronize the header
    /// Must be called after all items are written
    pub fn finalize(&mut self) {
        if self.u32_data.len() < HEADER_SIZE {
            return;
        }

        self.u32_data[8] = self.u32_data.len() as u32;
        let fonts = std::mem::take(&mut self.fonts);
        for family in &fonts {
            let entry = self.push_text(family);
            self.u32_data.extend_from_slice(&entry);
        }
        self.u32_data[7] = fonts.len() as u32;
        self.fonts = fonts;

        self.u32_data[5] = self.item_count;
        self.u32_data[6] = self.text_data.len() as u32;

        #[cfg(debug_assertions)]
        self.validate_text_offsets();
    }

    /// Validate that all text offsets are within bounds (debug builds only)
    #[cfg(debug_assertions)]
    fn validate_text_offsets(&self) {
        let item_count = self.u32_data[5] as usize;
        let text_len = self.text_data.len();

        for item in 0..item_count {
            let idx = HEADER_SIZE + item * U32_PER_ITEM;
            if idx + U32_PER_ITEM > self.u32_data.len() {
                break;
            }
            let offset = self.u32_data[idx + 1] as usize;
            let len = self.u32_data[idx + 2] as usize;
            debug_assert!(
                offset + len <= text_len,
                "Invalid text range for item {}: offset {} + length {} > text buffer size {}",
                item,
                offset,
                len,
                text_len
            );
        }
    }

    // Accessors for WASM
    // Return u32 instead of usize for explicit WASM contract (wasm32 linear memory uses u32 offsets)

    pub fn u32_ptr(&self) -> u32 {
        self.u32_data.as_ptr() as u32
    }

    pub fn u32_len(&self) -> u32 {
        self.u32_data.len() as u32
    }

    pub fn f32_ptr(&self) -> u32 {
        self.f32_data.as_ptr() as u32
    }

    pub fn f32_len(&self) -> u32 {
        self.f32_data.len() as u32
    }

    pub fn text_ptr(&self) -> u32 {
        self.text_data.as_ptr() as u32
    }

    pub fn text_len(&self) -> u32 {
        self.text_data.len() as u32
    }
}
