//! Autosave debouncing
//!
//! Edits mark the document dirty; the host polls and persists once typing has paused.
//! Pagination never waits on this.

/// Default quiet period before a save
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    debounce_ms: u64,
    /// Time of the latest unsaved edit
    last_edit: Option<u64>,
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl SaveDebouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            last_edit: None,
        }
    }

    /// Record an edit at `now_ms`, restarting the quiet period
    pub fn mark_dirty(&mut self, now_ms: u64) {
        self.last_edit = Some(now_ms);
    }

    pub fn is_dirty(&self) -> bool {
        self.last_edit.is_some()
    }

    /// True exactly once when the quiet period has elapsed since the last edit
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.last_edit {
            Some(at) if now_ms.saturating_sub(at) >= self.debounce_ms => {
                self.last_edit = None;
                true
            }
            _ => false,
        }
    }

    /// Save now regardless of the quiet period; true if anything was pending
    pub fn flush(&mut self) -> bool {
        self.last_edit.take().is_some()
    }
}

/// Get current timestamp in milliseconds
pub fn current_timestamp() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
