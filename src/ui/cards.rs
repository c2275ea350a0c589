//! Card list: one two-line card per visible entry, plus the sentinel row
//! that reveals the next batch when it scrolls into view.

use crate::app::{App, CardState};
use crate::catalog::ViewStatus;
use crate::theme::category_color;
use crate::util::{capitalize, format_id, truncate_to_width};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::render::spinner;

/// Terminal rows per card.
const CARD_HEIGHT: usize = 2;

/// Whether the sentinel row (at index `len`) is inside a viewport of
/// `height` rows starting at card `offset`.
fn sentinel_in_view(offset: usize, len: usize, height: usize) -> bool {
    let cards_below = len.saturating_sub(offset);
    cards_below * CARD_HEIGHT < height
}

pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let title = match app.listing_loaded_at {
        Some(at) => format!(" Catalog · updated {} ", at.format("%H:%M")),
        None => " Catalog ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.panel_border_focused)
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    match &app.catalog_view.status {
        ViewStatus::Loading => {
            render_message(f, inner, format!("{} Loading catalog...", spinner(app)), app.palette.loading);
            return;
        }
        ViewStatus::Empty => {
            render_message(f, inner, "No entries match the current filter".to_string(), app.palette.empty);
            return;
        }
        ViewStatus::Failed(e) => {
            let hint = app
                .keybindings
                .key_hint(crate::keybindings::Action::Retry, crate::keybindings::Context::List)
                .unwrap_or_else(|| "r".to_string());
            render_message(
                f,
                inner,
                format!("Could not load the catalog: {}\nPress {} to retry", e, hint),
                app.palette.error,
            );
            return;
        }
        ViewStatus::Ready => {}
    }

    let name_width = usize::from(inner.width).saturating_sub(10);
    let mut items: Vec<ListItem> = app
        .catalog_view
        .visible_entries
        .iter()
        .map(|entry| {
            let favorite = entry.id().is_some_and(|id| app.prefs.is_favorite(id));
            let id = entry.id().map(format_id).unwrap_or_default();
            let name = capitalize(entry.name.as_str());

            let header = Line::from(vec![
                Span::styled(if favorite { "♥ " } else { "  " }, app.palette.favorite),
                Span::styled(format!("{:<6} ", id), app.palette.card_id),
                Span::styled(truncate_to_width(&name, name_width).into_owned(), app.palette.card_name),
            ]);
            let detail = card_detail_line(app, &entry.name);
            ListItem::new(Text::from(vec![header, detail]))
        })
        .collect();

    if app.catalog_view.can_grow {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("  {} Loading more...", spinner(app)),
            app.palette.sentinel,
        ))));
    }

    let list = List::new(items).highlight_style(app.palette.card_selected);
    let mut state = ListState::default()
        .with_offset(app.list_offset)
        .with_selected(Some(app.selected));
    f.render_stateful_widget(list, inner, &mut state);

    let height = usize::from(inner.height);
    let len = app.catalog_view.visible_entries.len();
    app.list_offset = state.offset();
    app.list_visible_rows = (height / CARD_HEIGHT).max(1);
    app.sentinel_visible =
        app.catalog_view.can_grow && sentinel_in_view(app.list_offset, len, height);
}

/// Second card line: type badges once the card's record is in.
fn card_detail_line<'a>(app: &App, name: &str) -> Line<'a> {
    let mut spans = vec![Span::raw("         ")];
    match app.card(name) {
        Some(CardState::Loaded(record)) => {
            for t in &record.types {
                spans.push(Span::styled(
                    format!("{} ", t),
                    Style::default().fg(category_color(t)),
                ));
            }
        }
        Some(CardState::Failed) => spans.push(Span::styled("details unavailable", app.palette.muted)),
        _ => spans.push(Span::styled("...", app.palette.muted)),
    }
    Line::from(spans)
}

fn render_message(f: &mut Frame, area: Rect, text: String, style: Style) {
    let paragraph = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_hidden_when_cards_fill_view() {
        // 20 cards, 10-row viewport at the top: 5 cards visible.
        assert!(!sentinel_in_view(0, 20, 10));
    }

    #[test]
    fn test_sentinel_visible_at_bottom() {
        // Scrolled so the last 4 cards take 8 of 10 rows.
        assert!(sentinel_in_view(16, 20, 10));
    }

    #[test]
    fn test_sentinel_needs_a_spare_row() {
        // The last 5 cards exactly fill 10 rows.
        assert!(!sentinel_in_view(15, 20, 10));
    }

    #[test]
    fn test_sentinel_visible_on_tall_terminal() {
        assert!(sentinel_in_view(0, 20, 60));
    }
}
