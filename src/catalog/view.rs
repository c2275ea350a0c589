use crate::api::{CatalogEntry, FetchError};
use crate::catalog::filter::{filter_entries, FilterState};
use crate::catalog::window::DisplayWindow;

/// Resolution state of the listing the view is built from.
#[derive(Debug, Clone, Copy)]
pub enum SourceList<'a> {
    Pending,
    Failed(&'a FetchError),
    Resolved(&'a [CatalogEntry]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    /// Source resolved, nothing matched the filter.
    Empty,
    Ready,
    Failed(FetchError),
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogView {
    pub status: ViewStatus,
    pub visible_entries: Vec<CatalogEntry>,
    pub total_filtered: usize,
    pub can_grow: bool,
}

impl CatalogView {
    fn without_entries(status: ViewStatus) -> Self {
        Self {
            status,
            visible_entries: Vec::new(),
            total_filtered: 0,
            can_grow: false,
        }
    }
}

/// Pure view computation: filter the source, then take the window's head.
pub fn compute_view(source: SourceList<'_>, filter: &FilterState, window: &DisplayWindow) -> CatalogView {
    let entries = match source {
        SourceList::Pending => return CatalogView::without_entries(ViewStatus::Loading),
        SourceList::Failed(e) => return CatalogView::without_entries(ViewStatus::Failed(e.clone())),
        SourceList::Resolved(entries) => entries,
    };

    let filtered = filter_entries(entries, &filter.search_term);
    let total = filtered.len();
    if total == 0 {
        return CatalogView::without_entries(ViewStatus::Empty);
    }

    CatalogView {
        status: ViewStatus::Ready,
        visible_entries: filtered
            .into_iter()
            .take(window.visible_len(total))
            .cloned()
            .collect(),
        total_filtered: total,
        can_grow: window.can_grow(total),
    }
}
