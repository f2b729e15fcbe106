//! Session notifications and snapshots

use crate::layout::Page;
use crate::render::PageDiff;

/// Identifier of an open document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DocumentId(pub u64);

/// Pagination lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No geometry yet; pages are a placeholder
    #[default]
    Uninitialized,
    Paginating,
    Stable,
}

/// Notification sent to observers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PagesChanged(PageDiff),
    CurrentPageChanged { page: usize },
    /// The view should scroll `page` into view
    ScrollRequested { page: usize },
    DocumentLoaded { id: DocumentId },
}

/// Plain snapshot of the pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState {
    pub pages: Vec<Page>,
    /// 1-based, always within `[1, pages.len()]`
    pub current_page: usize,
}

/// One entry of the thumbnail rail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thumbnail {
    pub number: usize,
    pub is_current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

pub type Observer = Box<dyn FnMut(&SessionEvent)>;

/// Registered observer callbacks
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, Observer)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn emit(&mut self, event: &SessionEvent) {
        for (_, observer) in &mut self.entries {
            observer(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}
