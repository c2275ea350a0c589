//! Help overlay: scrollable keybinding table.
//!
//! Shows the effective bindings, user overrides included, grouped by context.

use crate::app::App;
use crate::keybindings::Context;
use ratatui::{
    layout::{Constraint, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use super::render::centered_rect;

const CONTEXT_ORDER: [Context; 5] = [
    Context::Global,
    Context::List,
    Context::Detail,
    Context::Search,
    Context::Settings,
];

/// Table rows for every binding, one header row per non-empty context.
fn binding_rows(app: &App) -> Vec<Row<'static>> {
    let bindings = app.keybindings.all_bindings();
    let mut rows = Vec::new();

    for ctx in CONTEXT_ORDER {
        let mut group = bindings.iter().filter(|(c, ..)| *c == ctx).peekable();
        if group.peek().is_none() {
            continue;
        }
        if !rows.is_empty() {
            rows.push(Row::new(vec![String::new(), String::new()]));
        }
        rows.push(
            Row::new(vec![
                Line::from(format!("-- {} --", ctx.label())),
                Line::from(""),
            ])
            .style(app.palette.heading),
        );
        for (_, key, _, description) in group {
            rows.push(Row::new(vec![format!("  {}", key), description.to_string()]));
        }
    }
    rows
}

pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let rows = binding_rows(app);
    let total_rows = rows.len();

    // -2 border, -2 header and its margin
    let visible_height = usize::from(overlay.height.saturating_sub(4));
    let max_scroll = total_rows.saturating_sub(visible_height);
    let scroll = app.help_scroll_offset.min(max_scroll);
    let visible: Vec<Row> = rows.into_iter().skip(scroll).take(visible_height).collect();

    let title = if max_scroll > 0 {
        format!(" Help ({}/{}) ", scroll + 1, max_scroll + 1)
    } else {
        " Help (? to close) ".to_string()
    };

    let table = Table::new(visible, [Constraint::Length(16), Constraint::Min(20)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.overlay_border)
                .title(title),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(app.palette.label.add_modifier(Modifier::UNDERLINED))
                .bottom_margin(1),
        )
        .style(app.palette.body);
    f.render_widget(table, overlay);

    if scroll < max_scroll {
        let hint_area = Rect {
            x: overlay.x + 1,
            y: overlay.y + overlay.height.saturating_sub(1),
            width: overlay.width.saturating_sub(2),
            height: 1,
        };
        f.render_widget(
            Paragraph::new(Span::styled(
                " j/k to scroll, ? or Esc to close ",
                app.palette.muted,
            )),
            hint_area,
        );
    }
}
