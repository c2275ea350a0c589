//! Search line and type filter bar above the card list.

use crate::app::App;
use crate::catalog::ViewStatus;
use crate::theme::{category_color, category_names};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Columns between two type labels.
const GAP: usize = 1;

/// Greedy wrap of the type labels (each padded by one space per side) into
/// rows no wider than `width`.
fn wrap_labels(width: u16) -> Vec<Vec<&'static str>> {
    let width = usize::from(width).max(1);
    let mut rows: Vec<Vec<&'static str>> = vec![Vec::new()];
    let mut used = 0;

    for name in category_names() {
        let label = name.len() + 2;
        let needed = if used == 0 { label } else { label + GAP };
        if used > 0 && used + needed > width {
            rows.push(Vec::new());
            used = 0;
        }
        used += if used == 0 { label } else { label + GAP };
        if let Some(row) = rows.last_mut() {
            row.push(name);
        }
    }
    rows
}

/// Rows the type bar needs at `width`.
pub(super) fn height(width: u16) -> u16 {
    u16::try_from(wrap_labels(width).len()).unwrap_or(u16::MAX)
}

/// Type filter bar. The active type is drawn filled.
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    let active = app.selected_category();
    let lines: Vec<Line> = wrap_labels(area.width)
        .into_iter()
        .map(|row| {
            let mut spans = Vec::with_capacity(row.len() * 2);
            for (i, name) in row.into_iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw(" ".repeat(GAP)));
                }
                let color = category_color(name);
                let style = if active == Some(name) {
                    Style::default()
                        .bg(color)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(color)
                };
                spans.push(Span::styled(format!(" {} ", name), style));
            }
            Line::from(spans)
        })
        .collect();

    f.render_widget(Paragraph::new(lines), area);
}

/// Search input on the left, "Showing X of Y" on the right.
pub(super) fn render_search(f: &mut Frame, app: &App, area: Rect) {
    let term = &app.prefs.filter().search_term;
    let search = if app.search_mode {
        Line::from(vec![
            Span::styled("Search: ", app.palette.search_active),
            Span::styled(format!("{}_", term), app.palette.search_active),
        ])
    } else if term.is_empty() {
        Line::from(Span::styled("/ to search", app.palette.muted))
    } else {
        Line::from(vec![
            Span::styled("Search: ", app.palette.label),
            Span::styled(term.as_str(), app.palette.body),
        ])
    };
    f.render_widget(Paragraph::new(search), area);

    let view = &app.catalog_view;
    if view.status == ViewStatus::Ready {
        let counter = format!(
            "Showing {} of {}",
            view.visible_entries.len(),
            view.total_filtered
        );
        f.render_widget(
            Paragraph::new(Span::styled(counter, app.palette.muted)).alignment(Alignment::Right),
            area,
        );
    }
}
