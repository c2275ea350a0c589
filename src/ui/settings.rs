//! Settings overlay: sound and theme toggles.

use crate::app::{App, SETTINGS_ITEMS};
use crate::keybindings::{Action, Context};
use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::render::centered_rect;

/// Value column for each settings row, in `SETTINGS_ITEMS` order.
fn values(app: &App) -> [String; SETTINGS_ITEMS.len()] {
    let prefs = app.prefs.get();
    let sound = if prefs.sound_enabled { "on" } else { "off" };
    let theme = if prefs.theme.name() == app.theme_variant.name() {
        prefs.theme.name().to_string()
    } else {
        format!("{} ({})", prefs.theme.name(), app.theme_variant.name())
    };
    [sound.to_string(), theme]
}

pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(50, 40, f.area());
    if overlay.width < 24 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let mut lines: Vec<Line> = SETTINGS_ITEMS
        .iter()
        .zip(values(app))
        .enumerate()
        .map(|(i, (label, value))| {
            let style = if i == app.settings_cursor {
                app.palette.overlay_selected
            } else {
                app.palette.body
            };
            Line::from(vec![
                Span::styled(format!(" {:<8}", label), style),
                Span::styled(value, style),
            ])
        })
        .collect();

    let close = app
        .keybindings
        .key_hint(Action::ToggleSettings, Context::Settings)
        .unwrap_or_else(|| ",".to_string());
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" Enter to change, {} to close", close),
        app.palette.muted,
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.overlay_border)
        .title(" Settings ");
    f.render_widget(Paragraph::new(lines).block(block), overlay);
}
