//! Input handling for the TUI.
//!
//! Resolves each key through the keybinding registry for the active context
//! and dispatches the resulting action.

use crate::app::{App, AppEvent, View};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{ring_bell, spawn_detail_load, sync_catalog};
use super::Action;

/// Keybinding context for the current mode. Overlays win over the view.
fn current_context(app: &App) -> KbContext {
    if app.settings_open() {
        KbContext::Settings
    } else if app.search_mode {
        KbContext::Search
    } else {
        match app.view {
            View::List => KbContext::List,
            View::Detail => KbContext::Detail,
        }
    }
}

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Help overlay captures all keys while visible
    if app.show_help {
        handle_help_input(app, code);
        return Ok(Action::Continue);
    }

    let context = current_context(app);
    let action = app.keybindings.action_for_key(code, modifiers, context);

    if context == KbContext::Search && action.is_none() {
        handle_search_text(app, code, modifiers, event_tx);
        return Ok(Action::Continue);
    }

    let Some(action) = action else {
        return Ok(Action::Continue);
    };

    if action == KbAction::Quit {
        return Ok(Action::Quit);
    }

    match context {
        KbContext::Settings => handle_settings_action(app, action),
        KbContext::Search => {
            if action == KbAction::ExitSearch {
                app.search_mode = false;
            } else {
                handle_view_action(app, action, event_tx);
            }
        }
        _ => handle_view_action(app, action, event_tx),
    }

    Ok(Action::Continue)
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
}

/// Printable keys edit the search term; the list filters as you type.
fn handle_search_text(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let requests = match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => app.push_search_char(c),
        KeyCode::Backspace => app.pop_search_char(),
        _ => return,
    };
    sync_catalog(app, requests, event_tx);
}

fn handle_settings_action(app: &mut App, action: KbAction) {
    match action {
        KbAction::NavDown => app.settings_nav(true),
        KbAction::NavUp => app.settings_nav(false),
        KbAction::Select => {
            let msg = app.settings_select();
            app.set_status(msg);
        }
        KbAction::ToggleSettings | KbAction::Back => app.toggle_settings(),
        KbAction::ShowHelp => app.show_help = true,
        _ => {}
    }
}

/// Actions shared by the list and detail views.
fn handle_view_action(app: &mut App, action: KbAction, event_tx: &mpsc::Sender<AppEvent>) {
    match action {
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::ToggleSettings => app.toggle_settings(),
        KbAction::ToggleSound => {
            let msg = if app.toggle_sound() { "Sound on" } else { "Sound off" };
            app.set_status(msg);
        }
        KbAction::CycleTheme => {
            let theme = app.cycle_theme();
            app.set_status(format!("Theme: {}", theme.name()));
        }
        KbAction::ToggleFavorite => toggle_favorite(app),
        _ => match app.view {
            View::List => handle_list_action(app, action, event_tx),
            View::Detail => handle_detail_action(app, action, event_tx),
        },
    }
}

fn toggle_favorite(app: &mut App) {
    match app.toggle_favorite() {
        Some((id, now_favorite)) => {
            if app.prefs.get().sound_enabled {
                ring_bell();
            }
            let verb = if now_favorite { "Added" } else { "Removed" };
            app.set_status(format!("{} {} favorites", verb, crate::util::format_id(id)));
        }
        None => app.set_status("Nothing selected"),
    }
}

fn handle_list_action(app: &mut App, action: KbAction, event_tx: &mpsc::Sender<AppEvent>) {
    match action {
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::PageDown => app.page_down(),
        KbAction::PageUp => app.page_up(),
        KbAction::Top => app.select_first(),
        KbAction::Bottom => app.select_last(),
        KbAction::Select => {
            if let Some((name, generation)) = app.open_detail() {
                spawn_detail_load(app, name, generation, event_tx);
            }
        }
        KbAction::EnterSearch => app.search_mode = true,
        KbAction::Back => {
            // Esc in the list clears the search, then the type filter.
            let requests = if !app.prefs.filter().search_term.is_empty() {
                app.set_search_term("")
            } else {
                app.clear_category()
            };
            sync_catalog(app, requests, event_tx);
        }
        KbAction::NextCategory => {
            let requests = app.cycle_category(true);
            sync_catalog(app, requests, event_tx);
        }
        KbAction::PrevCategory => {
            let requests = app.cycle_category(false);
            sync_catalog(app, requests, event_tx);
        }
        KbAction::ClearCategory => {
            let requests = app.clear_category();
            sync_catalog(app, requests, event_tx);
        }
        KbAction::Retry => {
            let requests = app.retry_listings();
            if requests.is_empty() {
                app.set_status("Nothing to retry");
            }
            sync_catalog(app, requests, event_tx);
        }
        _ => {}
    }
}

fn handle_detail_action(app: &mut App, action: KbAction, event_tx: &mpsc::Sender<AppEvent>) {
    match action {
        KbAction::Back => app.close_detail(),
        KbAction::ScrollDown | KbAction::NavDown => app.scroll_detail(true),
        KbAction::ScrollUp | KbAction::NavUp => app.scroll_detail(false),
        KbAction::Retry => {
            if let Some(name) = app.detail.as_ref().map(|d| d.name.clone()) {
                let (name, generation) = app.open_detail_for(name);
                spawn_detail_load(app, name, generation, event_tx);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CatalogClient, CatalogEntry, CatalogStore};
    use crate::keybindings::KeybindingRegistry;
    use crate::preferences::{PreferenceStore, Preferences};
    use std::sync::Arc;

    fn test_app() -> App {
        let client = CatalogClient::new("http://127.0.0.1:9/api/v2").unwrap();
        let prefs = PreferenceStore::new(Preferences {
            sound_enabled: false,
            ..Preferences::default()
        });
        let mut app = App::new(CatalogStore::new(client), prefs, KeybindingRegistry::new());
        app.apply_filter();
        app.on_full_listing(Ok(Arc::new(vec![
            CatalogEntry::new("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
            CatalogEntry::new("ivysaur", "https://pokeapi.co/api/v2/pokemon/2/"),
            CatalogEntry::new("charmander", "https://pokeapi.co/api/v2/pokemon/4/"),
        ])));
        app
    }

    fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).unwrap()
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Quit));
    }

    #[tokio::test]
    async fn test_search_typing_filters() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);

        press(&mut app, KeyCode::Char('/'), &tx);
        assert!(app.search_mode);
        for c in "saur".chars() {
            press(&mut app, KeyCode::Char(c), &tx);
        }
        assert_eq!(app.catalog_view.total_filtered, 2);

        // 'q' is text while searching
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Continue));
        assert_eq!(app.prefs.filter().search_term, "saurq");
        press(&mut app, KeyCode::Backspace, &tx);

        press(&mut app, KeyCode::Enter, &tx);
        assert!(!app.search_mode);
        assert_eq!(app.prefs.filter().search_term, "saur");

        // Esc in the list clears the term
        press(&mut app, KeyCode::Esc, &tx);
        assert_eq!(app.catalog_view.total_filtered, 3);
    }

    #[tokio::test]
    async fn test_favorite_key_toggles_selected() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);

        press(&mut app, KeyCode::Char('j'), &tx);
        press(&mut app, KeyCode::Char('f'), &tx);
        assert!(app.prefs.is_favorite(2));
        press(&mut app, KeyCode::Char('f'), &tx);
        assert!(!app.prefs.is_favorite(2));
    }

    #[tokio::test]
    async fn test_enter_opens_detail_and_back_closes() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);

        press(&mut app, KeyCode::Enter, &tx);
        assert_eq!(app.view, View::Detail);
        assert_eq!(app.detail.as_ref().unwrap().name, "bulbasaur");
        assert!(app.detail_handle.is_some());

        press(&mut app, KeyCode::Char('b'), &tx);
        assert_eq!(app.view, View::List);
        assert!(app.detail_handle.is_none());
    }

    #[tokio::test]
    async fn test_tab_selects_category() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);

        press(&mut app, KeyCode::Tab, &tx);
        assert_eq!(app.selected_category(), Some("normal"));
        press(&mut app, KeyCode::Char('x'), &tx);
        assert_eq!(app.selected_category(), None);
    }

    #[tokio::test]
    async fn test_settings_overlay_routing() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);

        press(&mut app, KeyCode::Char(','), &tx);
        assert!(app.settings_open());
        // Favorite key does nothing inside the overlay
        press(&mut app, KeyCode::Char('f'), &tx);
        assert!(app.prefs.favorites().is_empty());

        press(&mut app, KeyCode::Enter, &tx);
        assert!(app.prefs.get().sound_enabled);

        press(&mut app, KeyCode::Esc, &tx);
        assert!(!app.settings_open());
    }

    #[tokio::test]
    async fn test_help_captures_keys() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);

        press(&mut app, KeyCode::Char('?'), &tx);
        assert!(app.show_help);
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Continue));
        assert!(!app.show_help);
    }
}
