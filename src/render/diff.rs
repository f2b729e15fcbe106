//! Page diff protocol for incremental updates

use crate::layout::Page;
use smallvec::SmallVec;

/// A single patch operation for the page view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePatch {
    /// A page was added at `index`
    InsertPage { index: usize },
    /// The page at `index` changed range, content or layout
    UpdatePage { index: usize },
    /// The page at `index` no longer exists
    RemovePage { index: usize },
}

/// Complete page diff to send to the view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDiff {
    /// Document version the new pages were built from
    pub version: u64,
    pub page_count: usize,
    pub patches: SmallVec<[PagePatch; 4]>,
}

impl PageDiff {
    /// Create empty diff
    pub fn new(version: u64, page_count: usize) -> Self {
        Self {
            version,
            page_count,
            patches: SmallVec::new(),
        }
    }

    /// Compare the previous and the current page lists
    pub fn between(previous: &[Page], current: &[Page], version: u64) -> Self {
        let mut diff = Self::new(version, current.len());

        // Remove pages that no longer exist
        for index in current.len()..previous.len() {
            diff.add_patch(PagePatch::RemovePage { index });
        }

        for (index, page) in current.iter().enumerate() {
            match previous.get(index) {
                None => diff.add_patch(PagePatch::InsertPage { index }),
                Some(old) if page_changed(old, page) => {
                    diff.add_patch(PagePatch::UpdatePage { index })
                }
                Some(_) => {}
            }
        }

        diff
    }

    /// Add a patch
    pub fn add_patch(&mut self, patch: PagePatch) {
        self.patches.push(patch);
    }

    /// Check if there are any patches
    pub fn has_patches(&self) -> bool {
        !self.patches.is_empty()
    }

    /// Get patch count
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }
}

fn page_changed(old: &Page, new: &Page) -> bool {
    old.range != new.range || old.lines != new.lines || old.content != new.content
}
