use crate::app::{App, View};
use crate::keybindings::{Action, Context};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Hints for the current context, built from the effective bindings.
fn hints(app: &App) -> String {
    let (context, actions): (Context, &[(Action, &str)]) = if app.settings_open() {
        (
            Context::Settings,
            &[(Action::Select, "change"), (Action::ToggleSettings, "close")],
        )
    } else if app.search_mode {
        (Context::Search, &[(Action::ExitSearch, "done")])
    } else {
        match app.view {
            View::List => (
                Context::List,
                &[
                    (Action::EnterSearch, "search"),
                    (Action::NextCategory, "type"),
                    (Action::Select, "open"),
                    (Action::ToggleFavorite, "favorite"),
                    (Action::ToggleSettings, "settings"),
                    (Action::ShowHelp, "help"),
                    (Action::Quit, "quit"),
                ],
            ),
            View::Detail => (
                Context::Detail,
                &[
                    (Action::Back, "back"),
                    (Action::ScrollDown, "scroll"),
                    (Action::ToggleFavorite, "favorite"),
                    (Action::ShowHelp, "help"),
                    (Action::Quit, "quit"),
                ],
            ),
        }
    };

    let mut out = String::new();
    if app.search_mode && !app.settings_open() {
        out.push_str("Type to search | ");
    }
    let parts: Vec<String> = actions
        .iter()
        .filter_map(|(action, word)| {
            app.keybindings
                .key_hint(*action, context)
                .map(|key| format!("[{}] {}", key, word))
        })
        .collect();
    out.push_str(&parts.join("  "));
    out
}

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = match &app.status_message {
        Some((msg, _)) => Cow::Borrowed(msg.as_ref()),
        None => Cow::Owned(hints(app)),
    };
    f.render_widget(Paragraph::new(text).style(app.palette.status_bar), area);
}
