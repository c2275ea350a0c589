//! Merges the full listing with an optional category listing and applies the
//! filter and display window on top.
//!
//! The aggregator never performs I/O. [`CatalogAggregator::on_filter_changed`]
//! tells the caller which listings to fetch, and the caller feeds results back
//! through `apply_*`. Results for a category that is no longer selected are
//! dropped.

use crate::api::{CatalogEntry, FetchError};
use crate::catalog::filter::{filter_entries, FilterState};
use crate::catalog::view::{compute_view, CatalogView, SourceList};
use crate::catalog::window::DisplayWindow;
use std::sync::Arc;

/// A listing fetch the caller must start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    FullListing,
    Category(String),
}

/// Coarse lifecycle of the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Default)]
enum Listing {
    #[default]
    Unrequested,
    Pending,
    Resolved(Arc<Vec<CatalogEntry>>),
    Failed(FetchError),
}

impl Listing {
    fn needs_request(&self) -> bool {
        matches!(self, Listing::Unrequested | Listing::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct CatalogAggregator {
    filter: FilterState,
    window: DisplayWindow,
    full: Listing,
    category: Option<(String, Listing)>,
}

impl CatalogAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a new filter. Returns the listings that must now be fetched.
    ///
    /// Any change to the search term or category resets the display window.
    /// A search change alone never requests anything; a category change
    /// requests that category (and re-requests a failed full listing).
    pub fn on_filter_changed(&mut self, filter: &FilterState) -> Vec<SourceRequest> {
        let category_changed = filter.selected_category != self.filter.selected_category;
        if category_changed || filter.search_term != self.filter.search_term {
            self.window.reset();
        }
        self.filter = filter.clone();

        let mut requests = Vec::new();

        let full_needed = match self.full {
            Listing::Unrequested => true,
            Listing::Failed(_) => category_changed,
            _ => false,
        };
        if full_needed {
            self.full = Listing::Pending;
            requests.push(SourceRequest::FullListing);
        }

        match &filter.selected_category {
            Some(category) => {
                let same = matches!(&self.category, Some((current, _)) if current == category);
                if !same {
                    self.category = Some((category.clone(), Listing::Pending));
                    requests.push(SourceRequest::Category(category.clone()));
                }
            }
            None => self.category = None,
        }

        if !requests.is_empty() {
            tracing::debug!(requests = ?requests, "Catalog sources requested");
        }
        requests
    }

    /// Re-request every listing that failed. Used by the explicit retry action.
    pub fn retry(&mut self) -> Vec<SourceRequest> {
        let mut requests = Vec::new();
        if matches!(self.full, Listing::Failed(_)) {
            self.full = Listing::Pending;
            requests.push(SourceRequest::FullListing);
        }
        if let Some((category, listing)) = &mut self.category {
            if listing.needs_request() {
                *listing = Listing::Pending;
                requests.push(SourceRequest::Category(category.clone()));
            }
        }
        requests
    }

    pub fn apply_full_listing(&mut self, result: Result<Arc<Vec<CatalogEntry>>, FetchError>) {
        self.full = match result {
            Ok(entries) => {
                tracing::debug!(entries = entries.len(), "Full listing resolved");
                Listing::Resolved(entries)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Full listing failed");
                Listing::Failed(e)
            }
        };
    }

    /// Apply a category listing. Returns `false` when `category` is no longer
    /// the selected one; the result is then discarded.
    pub fn apply_category_listing(
        &mut self,
        category: &str,
        result: Result<Arc<Vec<CatalogEntry>>, FetchError>,
    ) -> bool {
        let Some((current, listing)) = &mut self.category else {
            tracing::debug!(category = %category, "Discarding category listing, no category selected");
            return false;
        };
        if current.as_str() != category {
            tracing::debug!(
                category = %category,
                selected = %current,
                "Discarding stale category listing"
            );
            return false;
        }

        *listing = match result {
            Ok(entries) => Listing::Resolved(entries),
            Err(e) => {
                tracing::warn!(category = %category, error = %e, "Category listing failed");
                Listing::Failed(e)
            }
        };
        true
    }

    /// The end-of-list sentinel became visible. Returns whether more entries
    /// were revealed.
    pub fn notify_sentinel_visible(&mut self) -> bool {
        let total = match self.source() {
            SourceList::Resolved(entries) => filter_entries(entries, &self.filter.search_term).len(),
            _ => return false,
        };
        self.window.grow(total)
    }

    pub fn view(&self) -> CatalogView {
        compute_view(self.source(), &self.filter, &self.window)
    }

    /// Entries currently revealed: `min(window, filtered.len())`.
    pub fn displayed_count(&self) -> usize {
        match self.source() {
            SourceList::Resolved(entries) => self
                .window
                .visible_len(filter_entries(entries, &self.filter.search_term).len()),
            _ => 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if matches!(self.full, Listing::Unrequested) && self.category.is_none() {
            return Phase::Idle;
        }
        match self.source() {
            SourceList::Pending => Phase::Loading,
            SourceList::Failed(_) => Phase::Failed,
            SourceList::Resolved(_) => Phase::Ready,
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The full listing once resolved, regardless of the selected category.
    pub fn full_listing(&self) -> Option<&Arc<Vec<CatalogEntry>>> {
        match &self.full {
            Listing::Resolved(entries) => Some(entries),
            _ => None,
        }
    }

    /// Both listings gate readiness: the view stays loading until the full
    /// listing and (if selected) the category listing have resolved.
    fn source(&self) -> SourceList<'_> {
        if let Listing::Failed(e) = &self.full {
            return SourceList::Failed(e);
        }
        if let Some((_, Listing::Failed(e))) = &self.category {
            return SourceList::Failed(e);
        }
        let Listing::Resolved(all) = &self.full else {
            return SourceList::Pending;
        };
        match &self.category {
            None => SourceList::Resolved(all.as_slice()),
            Some((_, Listing::Resolved(members))) => SourceList::Resolved(members.as_slice()),
            Some(_) => SourceList::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::view::ViewStatus;
    use pretty_assertions::assert_eq;

    fn listing(names: &[&str]) -> Arc<Vec<CatalogEntry>> {
        Arc::new(
            names
                .iter()
                .map(|n| CatalogEntry::new(*n, format!("u/{n}/")))
                .collect(),
        )
    }

    fn numbered(n: usize) -> Arc<Vec<CatalogEntry>> {
        Arc::new(
            (1..=n)
                .map(|i| CatalogEntry::new(format!("mon{i}"), format!("u/{i}/")))
                .collect(),
        )
    }

    fn visible_names(agg: &CatalogAggregator) -> Vec<String> {
        agg.view().visible_entries.into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_idle_until_first_filter() {
        let agg = CatalogAggregator::new();
        assert_eq!(agg.phase(), Phase::Idle);
    }

    #[test]
    fn test_first_filter_requests_full_listing() {
        let mut agg = CatalogAggregator::new();
        let requests = agg.on_filter_changed(&FilterState::default());
        assert_eq!(requests, vec![SourceRequest::FullListing]);
        assert_eq!(agg.phase(), Phase::Loading);
        assert_eq!(agg.view().status, ViewStatus::Loading);
    }

    #[test]
    fn test_search_filters_without_fetching() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        agg.apply_full_listing(Ok(listing(&["a", "b", "c", "aron"])));

        let requests = agg.on_filter_changed(&FilterState::new("a", None));
        assert!(requests.is_empty());
        assert_eq!(visible_names(&agg), vec!["a", "aron"]);
        assert_eq!(agg.phase(), Phase::Ready);
    }

    #[test]
    fn test_category_then_search_composes() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        agg.apply_full_listing(Ok(listing(&["charmander", "zubat", "vulpix"])));

        let requests = agg.on_filter_changed(&FilterState::new("", Some("fire")));
        assert_eq!(requests, vec![SourceRequest::Category("fire".into())]);
        assert_eq!(agg.view().status, ViewStatus::Loading);

        assert!(agg.apply_category_listing("fire", Ok(listing(&["charmander", "vulpix"]))));
        assert_eq!(visible_names(&agg), vec!["charmander", "vulpix"]);

        agg.on_filter_changed(&FilterState::new("z", Some("fire")));
        assert_eq!(agg.view().status, ViewStatus::Empty);
    }

    #[test]
    fn test_sentinel_growth_sequence() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        agg.apply_full_listing(Ok(numbered(45)));

        assert_eq!(agg.displayed_count(), 20);
        assert!(agg.notify_sentinel_visible());
        assert_eq!(agg.displayed_count(), 40);
        assert!(agg.notify_sentinel_visible());
        assert_eq!(agg.displayed_count(), 45);
        assert!(!agg.notify_sentinel_visible());
        assert_eq!(agg.displayed_count(), 45);
        assert!(!agg.view().can_grow);
    }

    #[test]
    fn test_filter_change_resets_window() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        agg.apply_full_listing(Ok(numbered(100)));
        agg.notify_sentinel_visible();
        agg.notify_sentinel_visible();
        assert_eq!(agg.displayed_count(), 60);

        agg.on_filter_changed(&FilterState::new("mon", None));
        assert_eq!(agg.displayed_count(), 20);
    }

    #[test]
    fn test_sentinel_ignored_while_loading() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        assert!(!agg.notify_sentinel_visible());
    }

    #[test]
    fn test_stale_category_result_discarded() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        agg.apply_full_listing(Ok(numbered(5)));

        agg.on_filter_changed(&FilterState::new("", Some("water")));
        agg.on_filter_changed(&FilterState::new("", Some("grass")));

        assert!(!agg.apply_category_listing("water", Ok(listing(&["squirtle"]))));
        assert_eq!(agg.view().status, ViewStatus::Loading);

        assert!(agg.apply_category_listing("grass", Ok(listing(&["bulbasaur"]))));
        assert_eq!(visible_names(&agg), vec!["bulbasaur"]);
    }

    #[test]
    fn test_clearing_category_returns_to_full_listing() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        agg.apply_full_listing(Ok(listing(&["a", "b"])));
        agg.on_filter_changed(&FilterState::new("", Some("fire")));
        agg.apply_category_listing("fire", Ok(listing(&["a"])));

        let requests = agg.on_filter_changed(&FilterState::default());
        assert!(requests.is_empty());
        assert_eq!(visible_names(&agg), vec!["a", "b"]);
    }

    #[test]
    fn test_failure_persists_until_retry() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        agg.apply_full_listing(Err(FetchError::Timeout));
        assert_eq!(agg.phase(), Phase::Failed);

        // Search edits do not retry.
        assert!(agg.on_filter_changed(&FilterState::new("pi", None)).is_empty());
        assert_eq!(agg.view().status, ViewStatus::Failed(FetchError::Timeout));

        assert_eq!(agg.retry(), vec![SourceRequest::FullListing]);
        assert_eq!(agg.phase(), Phase::Loading);
        agg.apply_full_listing(Ok(listing(&["pikachu", "pichu", "mew"])));
        assert_eq!(visible_names(&agg), vec!["pikachu", "pichu"]);
    }

    #[test]
    fn test_category_change_retries_failed_full_listing() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::default());
        agg.apply_full_listing(Err(FetchError::HttpStatus(502)));

        let requests = agg.on_filter_changed(&FilterState::new("", Some("ice")));
        assert_eq!(
            requests,
            vec![SourceRequest::FullListing, SourceRequest::Category("ice".into())]
        );
    }

    #[test]
    fn test_failed_category_reported() {
        let mut agg = CatalogAggregator::new();
        agg.on_filter_changed(&FilterState::new("", Some("dragon")));
        agg.apply_full_listing(Ok(numbered(3)));
        agg.apply_category_listing("dragon", Err(FetchError::NotFound));
        assert_eq!(agg.view().status, ViewStatus::Failed(FetchError::NotFound));
        assert_eq!(agg.retry(), vec![SourceRequest::Category("dragon".into())]);
    }
}
