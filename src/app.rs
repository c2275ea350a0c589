use crate::api::{CatalogEntry, CatalogStore, DetailRecord, FetchError};
use crate::catalog::detail::DetailResolution;
use crate::catalog::{CatalogAggregator, CatalogView, SourceRequest, ViewStatus, INITIAL_WINDOW};
use crate::keybindings::KeybindingRegistry;
use crate::preferences::{PreferenceStore, ThemePreference};
use crate::theme::{category_names, ColorPalette, ThemeVariant};
use crate::util::{strip_control_chars, MAX_SEARCH_TERM_LENGTH};
use chrono::{DateTime, Local};
use lru::LruCache;
use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::time::Instant;

/// Card summaries kept for list rendering. Older ones are refetched through
/// the query cache when scrolled back into view.
const CARD_CACHE_CAPACITY: usize = 512;

/// Rows below the viewport whose cards are requested ahead of scrolling.
const CARD_PREFETCH_ROWS: usize = 4;

/// Entries in the settings overlay, in display order.
pub const SETTINGS_ITEMS: [&str; 2] = ["Sound", "Theme"];

// ============================================================================
// View Enum
// ============================================================================

/// Current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Filter bar + card list
    List,
    /// Full record for one entry
    Detail,
}

// ============================================================================
// Card and Detail State
// ============================================================================

/// Per-card summary state. A failed card only degrades itself.
#[derive(Debug, Clone)]
pub enum CardState {
    Loading,
    Loaded(Arc<DetailRecord>),
    Failed,
}

/// The open detail view.
pub struct DetailState {
    pub name: String,
    /// Matches `App::detail_generation` while this view is current.
    pub generation: u64,
    /// `None` while the resolution is in flight.
    pub resolution: Option<DetailResolution>,
    pub scroll: usize,
    /// Last line that can sit at the top, set by the detail renderer.
    pub max_scroll: usize,
}

impl DetailState {
    pub fn record(&self) -> Option<&Arc<DetailRecord>> {
        self.resolution.as_ref()?.detail.as_ref().ok()
    }
}

// ============================================================================
// Events
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    FullListingLoaded(Result<Arc<Vec<CatalogEntry>>, FetchError>),
    CategoryLoaded {
        category: String,
        result: Result<Arc<Vec<CatalogEntry>>, FetchError>,
    },
    CardLoaded {
        name: String,
        result: Result<Arc<DetailRecord>, FetchError>,
    },
    /// Detail, species and evolution resolved for `name`.
    ///
    /// `generation` is the detail generation when the load was spawned;
    /// results for an older generation are dropped.
    DetailResolved {
        name: String,
        generation: u64,
        resolution: DetailResolution,
    },
    ArtworkLoaded {
        identifier: String,
        locator: Option<String>,
    },
    /// A background task panicked.
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub store: CatalogStore,
    pub prefs: PreferenceStore,
    pub catalog: CatalogAggregator,
    /// Last computed view of the catalog; refreshed after every aggregator change.
    pub catalog_view: CatalogView,

    // Theme
    pub theme_variant: ThemeVariant,
    pub palette: ColorPalette,
    /// `COLORFGBG` at startup, for resolving the `system` theme.
    terminal_bg: Option<String>,

    pub keybindings: KeybindingRegistry,

    // Cards
    pub cards: LruCache<String, CardState>,

    // UI State
    pub view: View,
    pub selected: usize,
    /// First card row on screen, kept across frames by the list renderer.
    pub list_offset: usize,
    /// Set by the list renderer when the sentinel row was on screen.
    pub sentinel_visible: bool,
    /// Card rows that fit in the list viewport at the last render.
    pub list_visible_rows: usize,

    // Search
    pub search_mode: bool,

    // Detail
    pub detail: Option<DetailState>,
    /// Incremented for every detail load; stale resolutions are discarded.
    pub detail_generation: u64,
    /// Handle to the current detail load task, aborted when leaving the view.
    pub detail_handle: Option<tokio::task::JoinHandle<()>>,
    /// Artwork locators by identifier. `None` means resolved without artwork.
    pub artwork: HashMap<String, Option<String>>,

    /// When the full listing last resolved.
    pub listing_loaded_at: Option<DateTime<Local>>,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub spinner_frame: usize,

    pub show_help: bool,
    pub help_scroll_offset: usize,
    pub settings_cursor: usize,
}

impl App {
    pub fn new(store: CatalogStore, prefs: PreferenceStore, keybindings: KeybindingRegistry) -> Self {
        let terminal_bg = std::env::var("COLORFGBG").ok();
        let theme_variant = ThemeVariant::resolve(prefs.get().theme, terminal_bg.as_deref());
        let catalog = CatalogAggregator::new();
        let catalog_view = catalog.view();

        Self {
            store,
            prefs,
            catalog,
            catalog_view,
            theme_variant,
            palette: theme_variant.palette(),
            terminal_bg,
            keybindings,
            cards: LruCache::new(
                NonZeroUsize::new(CARD_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
            view: View::List,
            selected: 0,
            list_offset: 0,
            sentinel_visible: false,
            list_visible_rows: 0,
            search_mode: false,
            detail: None,
            detail_generation: 0,
            detail_handle: None,
            artwork: HashMap::new(),
            listing_loaded_at: None,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            show_help: false,
            help_scroll_offset: 0,
            settings_cursor: 0,
        }
    }

    // ========================================================================
    // Theme and Settings
    // ========================================================================

    /// Re-resolve the palette from the stored theme preference.
    pub fn apply_theme(&mut self) {
        let variant = ThemeVariant::resolve(self.prefs.get().theme, self.terminal_bg.as_deref());
        if variant != self.theme_variant {
            self.theme_variant = variant;
            self.palette = variant.palette();
        }
        self.needs_redraw = true;
    }

    /// Advance light → dark → system. Returns the new preference.
    pub fn cycle_theme(&mut self) -> ThemePreference {
        let next = self.prefs.get().theme.next();
        self.prefs.set_theme(next);
        self.apply_theme();
        next
    }

    /// Returns whether sound is now enabled.
    pub fn toggle_sound(&mut self) -> bool {
        self.prefs.toggle_sound();
        self.prefs.get().sound_enabled
    }

    pub fn settings_open(&self) -> bool {
        self.prefs.get().settings_open
    }

    pub fn toggle_settings(&mut self) {
        self.prefs.toggle_settings_panel();
        self.settings_cursor = 0;
    }

    pub fn settings_nav(&mut self, down: bool) {
        let last = SETTINGS_ITEMS.len() - 1;
        self.settings_cursor = if down {
            (self.settings_cursor + 1).min(last)
        } else {
            self.settings_cursor.saturating_sub(1)
        };
    }

    /// Activate the settings entry under the cursor.
    pub fn settings_select(&mut self) -> Cow<'static, str> {
        match self.settings_cursor {
            0 => {
                if self.toggle_sound() {
                    Cow::Borrowed("Sound on")
                } else {
                    Cow::Borrowed("Sound off")
                }
            }
            _ => Cow::Owned(format!("Theme: {}", self.cycle_theme().name())),
        }
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Push the store's filter into the aggregator. Returns the listings
    /// the caller must fetch.
    pub fn apply_filter(&mut self) -> Vec<SourceRequest> {
        let requests = self.catalog.on_filter_changed(self.prefs.filter());
        self.selected = 0;
        self.list_offset = 0;
        self.refresh_view();
        requests
    }

    /// Replace the search term. Control characters are dropped and the term
    /// is capped at [`MAX_SEARCH_TERM_LENGTH`] characters.
    pub fn set_search_term(&mut self, term: &str) -> Vec<SourceRequest> {
        let clean: String = strip_control_chars(term)
            .chars()
            .take(MAX_SEARCH_TERM_LENGTH)
            .collect();
        if clean == self.prefs.filter().search_term {
            return Vec::new();
        }
        self.prefs.set_search_term(clean);
        self.apply_filter()
    }

    pub fn push_search_char(&mut self, c: char) -> Vec<SourceRequest> {
        let mut term = self.prefs.filter().search_term.clone();
        term.push(c);
        self.set_search_term(&term)
    }

    pub fn pop_search_char(&mut self) -> Vec<SourceRequest> {
        let mut term = self.prefs.filter().search_term.clone();
        term.pop();
        self.set_search_term(&term)
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.prefs.filter().selected_category.as_deref()
    }

    /// Select `category`, or clear it when it is already the active one.
    pub fn select_category(&mut self, category: &str) -> Vec<SourceRequest> {
        let next = if self.selected_category() == Some(category) {
            None
        } else {
            Some(category.to_string())
        };
        self.prefs.set_selected_category(next);
        self.apply_filter()
    }

    pub fn clear_category(&mut self) -> Vec<SourceRequest> {
        if self.selected_category().is_none() {
            return Vec::new();
        }
        self.prefs.set_selected_category(None);
        self.apply_filter()
    }

    /// Step through the filter bar. Past either end the filter is cleared.
    pub fn cycle_category(&mut self, forward: bool) -> Vec<SourceRequest> {
        let names: Vec<&'static str> = category_names().collect();
        let current = self
            .selected_category()
            .and_then(|c| names.iter().position(|n| *n == c));

        let next = match (current, forward) {
            (None, true) => names.first(),
            (None, false) => names.last(),
            (Some(i), true) => names.get(i + 1),
            (Some(0), false) => None,
            (Some(i), false) => names.get(i - 1),
        };

        match next {
            Some(name) => self.select_category(name),
            None => self.clear_category(),
        }
    }

    /// Re-request failed listings.
    pub fn retry_listings(&mut self) -> Vec<SourceRequest> {
        let requests = self.catalog.retry();
        self.refresh_view();
        requests
    }

    // ========================================================================
    // Listing Results
    // ========================================================================

    pub fn on_full_listing(&mut self, result: Result<Arc<Vec<CatalogEntry>>, FetchError>) {
        if let Err(e) = &result {
            self.set_status(format!("Catalog unavailable: {}", e));
        } else {
            self.listing_loaded_at = Some(Local::now());
        }
        self.catalog.apply_full_listing(result);
        self.refresh_view();
    }

    /// Returns `false` when the listing was for a category no longer selected.
    pub fn on_category_listing(
        &mut self,
        category: &str,
        result: Result<Arc<Vec<CatalogEntry>>, FetchError>,
    ) -> bool {
        if let Err(e) = &result {
            if self.selected_category() == Some(category) {
                self.set_status(format!("Type '{}' unavailable: {}", category, e));
            }
        }
        if !self.catalog.apply_category_listing(category, result) {
            return false;
        }
        self.refresh_view();
        true
    }

    /// Grow the window if the sentinel was seen. Returns whether it grew.
    pub fn on_sentinel_seen(&mut self) -> bool {
        if !std::mem::take(&mut self.sentinel_visible) {
            return false;
        }
        if self.catalog.notify_sentinel_visible() {
            self.refresh_view();
            true
        } else {
            false
        }
    }

    fn refresh_view(&mut self) {
        self.catalog_view = self.catalog.view();
        self.clamp_selection();
        self.needs_redraw = true;
    }

    pub fn visible_entries(&self) -> &[CatalogEntry] {
        &self.catalog_view.visible_entries
    }

    pub fn is_loading(&self) -> bool {
        self.catalog_view.status == ViewStatus::Loading
            || self.detail.as_ref().is_some_and(|d| d.resolution.is_none())
    }

    // ========================================================================
    // Cards
    // ========================================================================

    /// Entries in the card rows on screen, plus a few below.
    ///
    /// Before the first list render the whole initial window counts.
    fn on_screen_entries(&self) -> &[CatalogEntry] {
        let entries = &self.catalog_view.visible_entries;
        let rows = match self.list_visible_rows {
            0 => INITIAL_WINDOW,
            rows => rows + CARD_PREFETCH_ROWS,
        };
        let start = self.list_offset.min(entries.len());
        let end = start.saturating_add(rows).min(entries.len());
        &entries[start..end]
    }

    /// On-screen entries with no card state. Marks them loading.
    ///
    /// States of on-screen cards are promoted so revealing more rows evicts
    /// off-screen cards first.
    pub fn pending_cards(&mut self) -> Vec<String> {
        let on_screen: Vec<String> = self.on_screen_entries().iter().map(|e| e.name.clone()).collect();
        let mut names = Vec::new();
        for name in on_screen {
            // `get` promotes.
            if self.cards.get(&name).is_some() {
                continue;
            }
            self.cards.put(name.clone(), CardState::Loading);
            names.push(name);
        }
        names
    }

    pub fn on_card_loaded(&mut self, name: String, result: Result<Arc<DetailRecord>, FetchError>) {
        let state = match result {
            Ok(record) => CardState::Loaded(record),
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "Card detail failed");
                CardState::Failed
            }
        };
        self.cards.put(name, state);
    }

    /// Card state without touching recency.
    pub fn card(&self, name: &str) -> Option<&CardState> {
        self.cards.peek(name)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn selected_entry(&self) -> Option<&CatalogEntry> {
        self.catalog_view.visible_entries.get(self.selected)
    }

    fn last_index(&self) -> usize {
        self.catalog_view.visible_entries.len().saturating_sub(1)
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.last_index());
    }

    pub fn nav_down(&mut self) {
        self.selected = self.selected.saturating_add(1).min(self.last_index());
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn page_down(&mut self) {
        let step = self.list_visible_rows.max(1);
        self.selected = self.selected.saturating_add(step).min(self.last_index());
    }

    pub fn page_up(&mut self) {
        let step = self.list_visible_rows.max(1);
        self.selected = self.selected.saturating_sub(step);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.last_index();
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Id of the entry the user is looking at: the detail record in detail
    /// view, else the selected card.
    pub fn focused_id(&self) -> Option<u32> {
        match self.view {
            View::Detail => self.detail.as_ref()?.record().map(|r| r.id),
            View::List => self.selected_entry()?.id(),
        }
    }

    /// Toggle the focused entry. Returns `(id, now_favorite)`.
    pub fn toggle_favorite(&mut self) -> Option<(u32, bool)> {
        let id = self.focused_id()?;
        let now = self.prefs.toggle_favorite(id);
        Some((id, now))
    }

    // ========================================================================
    // Detail View
    // ========================================================================

    /// Open the detail view for the selected entry. Returns the name and
    /// generation to load.
    pub fn open_detail(&mut self) -> Option<(String, u64)> {
        let name = self.selected_entry()?.name.clone();
        Some(self.open_detail_for(name))
    }

    /// Open (or reload) the detail view for `name`.
    pub fn open_detail_for(&mut self, name: String) -> (String, u64) {
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
        }
        self.detail_generation = self.detail_generation.wrapping_add(1);
        let generation = self.detail_generation;
        self.detail = Some(DetailState {
            name: name.clone(),
            generation,
            resolution: None,
            scroll: 0,
            max_scroll: 0,
        });
        self.view = View::Detail;
        (name, generation)
    }

    pub fn close_detail(&mut self) {
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
            tracing::debug!("Aborted detail load on exit");
        }
        self.detail = None;
        self.view = View::List;
    }

    /// Store a resolution if it is still current. Returns the evolution
    /// identifiers whose artwork is not known yet, or `None` when stale.
    pub fn on_detail_resolved(
        &mut self,
        name: &str,
        generation: u64,
        resolution: DetailResolution,
    ) -> Option<Vec<String>> {
        let current = self
            .detail
            .as_mut()
            .filter(|d| d.generation == generation && d.name == name);
        let Some(detail) = current else {
            tracing::debug!(name = %name, generation, "Discarding stale detail");
            return None;
        };

        if let Ok(record) = &resolution.detail {
            self.cards
                .put(record.name.clone(), CardState::Loaded(Arc::clone(record)));
        }

        let missing = match &resolution.evolution {
            Some(Ok(chain)) => chain
                .identifiers()
                .into_iter()
                .filter(|id| !self.artwork.contains_key(*id))
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        detail.resolution = Some(resolution);
        self.detail_handle = None;
        Some(missing)
    }

    pub fn on_artwork_loaded(&mut self, identifier: String, locator: Option<String>) {
        self.artwork.insert(identifier, locator);
    }

    pub fn scroll_detail(&mut self, down: bool) {
        if let Some(detail) = &mut self.detail {
            detail.scroll = if down {
                detail.scroll.saturating_add(1).min(detail.max_scroll)
            } else {
                detail.scroll.saturating_sub(1)
            };
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

/// Abort the in-flight detail task on drop.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
        }
    }
}
