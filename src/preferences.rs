//! Preference store: favorites, sound, theme and panel state, plus the
//! transient filter intent.
//!
//! Persisted fields are published on a `watch` channel after every change.
//! [`spawn_persistence`] listens on that channel and writes the snapshot to
//! the key-value slot as one JSON blob:
//!
//! ```json
//! {"state":{"favorites":[1,25],"soundEnabled":true,"theme":"system","settingsOpen":false},"version":0}
//! ```
//!
//! The search term and selected category live here too but are never written.
use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::catalog::FilterState;
use crate::storage::Database;

/// Storage key of the persisted blob.
pub const STORAGE_KEY: &str = "pokedex-storage";
const STORAGE_VERSION: u32 = 0;

// ============================================================================
// Preference Types
// ============================================================================

/// Theme choice as stored. `System` follows the terminal's background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub const ALL: [ThemePreference; 3] = [
        ThemePreference::Light,
        ThemePreference::Dark,
        ThemePreference::System,
    ];

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
            Self::System => Self::Light,
        }
    }
}

/// The persisted part of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub favorites: BTreeSet<u32>,
    pub sound_enabled: bool,
    pub theme: ThemePreference,
    pub settings_open: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            favorites: BTreeSet::new(),
            sound_enabled: true,
            theme: ThemePreference::System,
            settings_open: false,
        }
    }
}

#[derive(Serialize)]
struct BlobRef<'a> {
    state: &'a Preferences,
    version: u32,
}

#[derive(Deserialize)]
struct Blob {
    state: Preferences,
    #[serde(default)]
    version: u32,
}

/// Serialize preferences into the stored blob format.
pub fn encode(prefs: &Preferences) -> Result<String> {
    serde_json::to_string(&BlobRef {
        state: prefs,
        version: STORAGE_VERSION,
    })
    .context("Failed to serialize preferences")
}

/// Parse a stored blob. Missing fields take their defaults; anything that is
/// not a blob at all is an error.
pub fn decode(raw: &str) -> Result<Preferences> {
    let blob: Blob = serde_json::from_str(raw).context("Stored preferences are not valid")?;
    if blob.version != STORAGE_VERSION {
        tracing::warn!(
            found = blob.version,
            expected = STORAGE_VERSION,
            "Preference blob version mismatch, reading anyway"
        );
    }
    Ok(blob.state)
}

// ============================================================================
// PreferenceStore
// ============================================================================

/// Single source of truth for user preferences and filter intent.
///
/// All mutation goes through `&mut self`; other tasks observe persisted state
/// through [`PreferenceStore::subscribe`].
pub struct PreferenceStore {
    prefs: Preferences,
    filter: FilterState,
    tx: watch::Sender<Preferences>,
}

impl PreferenceStore {
    pub fn new(initial: Preferences) -> Self {
        let (tx, _rx) = watch::channel(initial.clone());
        Self {
            prefs: initial,
            filter: FilterState::default(),
            tx,
        }
    }

    /// Rehydrate from the key-value slot.
    ///
    /// A missing blob yields `defaults`. A blob that cannot be read (or a
    /// database error) also yields `defaults`, with a warning.
    pub async fn load(db: &Database, defaults: Preferences) -> Self {
        let prefs = match db.get_value(STORAGE_KEY).await {
            Ok(Some(raw)) => match decode(&raw) {
                Ok(prefs) => prefs,
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable preferences");
                    defaults
                }
            },
            Ok(None) => defaults,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read preferences, using defaults");
                defaults
            }
        };
        Self::new(prefs)
    }

    /// Snapshot of the persisted fields.
    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Receiver that sees every persisted change.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    pub fn add_favorite(&mut self, id: u32) {
        if self.prefs.favorites.insert(id) {
            self.publish();
        }
    }

    pub fn remove_favorite(&mut self, id: u32) {
        if self.prefs.favorites.remove(&id) {
            self.publish();
        }
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.prefs.favorites.contains(&id)
    }

    /// Flip membership of `id`. Returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, id: u32) -> bool {
        if self.is_favorite(id) {
            self.remove_favorite(id);
            false
        } else {
            self.add_favorite(id);
            true
        }
    }

    pub fn favorites(&self) -> &BTreeSet<u32> {
        &self.prefs.favorites
    }

    // ========================================================================
    // Filter Intent (not persisted)
    // ========================================================================

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
    }

    pub fn set_selected_category(&mut self, category: Option<String>) {
        self.filter.selected_category = category;
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn toggle_settings_panel(&mut self) {
        self.prefs.settings_open = !self.prefs.settings_open;
        self.publish();
    }

    pub fn toggle_sound(&mut self) {
        self.prefs.sound_enabled = !self.prefs.sound_enabled;
        self.publish();
    }

    pub fn set_theme(&mut self, theme: ThemePreference) {
        if self.prefs.theme != theme {
            self.prefs.theme = theme;
            self.publish();
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.prefs.clone());
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Write `prefs` to the key-value slot.
pub async fn persist(db: &Database, prefs: &Preferences) -> Result<()> {
    let blob = encode(prefs)?;
    db.set_value(STORAGE_KEY, &blob)
        .await
        .context("Failed to write preferences")
}

/// Delete the stored blob. Returns whether one existed.
pub async fn reset(db: &Database) -> Result<bool> {
    db.delete_value(STORAGE_KEY).await
}

/// Spawn the writer that persists every published snapshot.
///
/// Runs until the store is dropped; the last snapshot is written before the
/// task ends. Write failures are logged and the next change is tried again.
pub fn spawn_persistence(db: Database, mut rx: watch::Receiver<Preferences>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if let Err(e) = persist(&db, &snapshot).await {
                tracing::warn!(error = %e, "Failed to persist preferences");
            } else {
                tracing::debug!(favorites = snapshot.favorites.len(), "Preferences persisted");
            }
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
