//! Application event handling.
//!
//! Applies background task results to the application state. Results for a
//! category or detail view that is no longer current are dropped here.

use crate::app::{App, AppEvent, View};
use tokio::sync::mpsc;

use super::helpers::{spawn_artwork_loads, spawn_card_loads};

/// Handle application events from background tasks.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::FullListingLoaded(result) => {
            app.on_full_listing(result);
            spawn_card_loads(app, event_tx);
        }
        AppEvent::CategoryLoaded { category, result } => {
            if app.on_category_listing(&category, result) {
                spawn_card_loads(app, event_tx);
            } else {
                tracing::debug!(category = %category, "Discarded listing for inactive type");
            }
        }
        AppEvent::CardLoaded { name, result } => {
            app.on_card_loaded(name, result);
        }
        AppEvent::DetailResolved {
            name,
            generation,
            resolution,
        } => {
            if let Some(missing) = app.on_detail_resolved(&name, generation, resolution) {
                spawn_artwork_loads(app, missing, event_tx);
            }
        }
        AppEvent::ArtworkLoaded {
            identifier,
            locator,
        } => {
            app.on_artwork_loaded(identifier, locator);
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.set_status(format!("Internal error in {}: {}", task, error));
            if task == "detail" && app.view == View::Detail {
                app.detail_handle = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CatalogClient, CatalogEntry, CatalogStore, FetchError};
    use crate::catalog::ViewStatus;
    use crate::keybindings::KeybindingRegistry;
    use crate::preferences::{PreferenceStore, Preferences};
    use std::sync::Arc;

    fn test_app() -> App {
        let client = CatalogClient::new("http://127.0.0.1:9/api/v2").unwrap();
        App::new(
            CatalogStore::new(client),
            PreferenceStore::new(Preferences::default()),
            KeybindingRegistry::new(),
        )
    }

    #[tokio::test]
    async fn test_full_listing_event_marks_cards_loading() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        app.apply_filter();

        let entries = vec![
            CatalogEntry::new("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
            CatalogEntry::new("ivysaur", "https://pokeapi.co/api/v2/pokemon/2/"),
        ];
        handle_app_event(&mut app, AppEvent::FullListingLoaded(Ok(Arc::new(entries))), &tx);

        assert_eq!(app.catalog_view.status, ViewStatus::Ready);
        assert!(app.card("bulbasaur").is_some());
        assert!(app.card("ivysaur").is_some());
    }

    #[tokio::test]
    async fn test_inactive_category_event_ignored() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        app.apply_filter();
        app.select_category("fire");

        handle_app_event(
            &mut app,
            AppEvent::CategoryLoaded {
                category: "water".to_string(),
                result: Ok(Arc::new(Vec::new())),
            },
            &tx,
        );
        assert_eq!(app.catalog_view.status, ViewStatus::Loading);
    }

    #[tokio::test]
    async fn test_failed_listing_event_sets_status() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        app.apply_filter();

        handle_app_event(
            &mut app,
            AppEvent::FullListingLoaded(Err(FetchError::HttpStatus(503))),
            &tx,
        );
        assert!(matches!(app.catalog_view.status, ViewStatus::Failed(_)));
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.contains("503"));
    }

    #[tokio::test]
    async fn test_panic_event_sets_status() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "card_detail",
                error: "boom".to_string(),
            },
            &tx,
        );
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.contains("card_detail"));
    }
}
