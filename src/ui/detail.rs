//! Detail view: record header, species text, stats, evolution tree and moves.

use crate::api::{DetailRecord, EvolutionNode, FetchError, SpeciesRecord};
use crate::app::App;
use crate::catalog::detail::{
    ability_preview, format_base_experience, move_preview, stat_label, stat_ratio,
};
use crate::theme::{category_color, ColorPalette};
use crate::util::{capitalize, format_id, humanize, strip_control_chars};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::collections::HashMap;

use super::render::spinner;

/// Width of a full stat bar in cells.
const BAR_WIDTH: usize = 30;

pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(detail) = &app.detail else {
        return;
    };

    let title = format!(" {} ", capitalize(&detail.name));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.panel_border_focused)
        .title(title);

    let lines = match &detail.resolution {
        None => vec![Line::from(Span::styled(
            format!("{} Loading {}...", spinner(app), detail.name),
            app.palette.loading,
        ))],
        Some(res) => match &res.detail {
            Err(e) => error_lines(&app.palette, "Could not load this entry", e, true),
            Ok(record) => {
                let favorite = app.prefs.is_favorite(record.id);
                let mut lines = header_lines(&app.palette, record, favorite);
                match &res.species {
                    Ok(species) => lines.extend(species_lines(&app.palette, species)),
                    Err(e) => lines.extend(error_lines(&app.palette, "Species data unavailable", e, false)),
                }
                lines.extend(stat_lines(&app.palette, record));
                match &res.evolution {
                    Some(Ok(chain)) => {
                        lines.extend(evolution_lines(&app.palette, chain, &record.species_name, &app.artwork))
                    }
                    Some(Err(e)) => {
                        lines.extend(error_lines(&app.palette, "Evolution data unavailable", e, false))
                    }
                    None => {}
                }
                lines.extend(move_lines(&app.palette, record));
                lines
            }
        },
    };

    // Stop once the last row is at the bottom of the panel.
    let inner = block.inner(area);
    let max_scroll = wrapped_rows(&lines, inner.width).saturating_sub(usize::from(inner.height));
    let scroll = detail.scroll.min(max_scroll);
    let scroll_u16 = u16::try_from(scroll).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll_u16, 0));
    f.render_widget(paragraph, area);

    if let Some(detail) = &mut app.detail {
        detail.scroll = scroll;
        detail.max_scroll = max_scroll;
    }
}

/// Display rows `lines` take up when wrapped to `width` cells.
fn wrapped_rows(lines: &[Line], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines.iter().map(|line| line.width().div_ceil(width).max(1)).sum()
}

fn section(palette: &ColorPalette, title: &str) -> [Line<'static>; 2] {
    [
        Line::from(""),
        Line::from(Span::styled(title.to_string(), palette.heading)),
    ]
}

fn error_lines(palette: &ColorPalette, what: &str, error: &FetchError, retry: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(format!("{}: {}", what, error), palette.error))];
    if retry {
        lines.push(Line::from(Span::styled("Press r to retry", palette.muted)));
    }
    lines
}

fn type_badges(types: &[String]) -> Vec<Span<'static>> {
    types
        .iter()
        .map(|t| {
            Span::styled(
                format!(" {} ", t),
                Style::default()
                    .bg(category_color(t))
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .flat_map(|badge| [badge, Span::raw(" ")])
        .collect()
}

fn header_lines(palette: &ColorPalette, record: &DetailRecord, favorite: bool) -> Vec<Line<'static>> {
    let mut name = vec![
        Span::styled(format!("{} ", format_id(record.id)), palette.card_id),
        Span::styled(capitalize(&record.name), palette.card_name),
    ];
    if favorite {
        name.push(Span::styled(" ♥", palette.favorite));
    }

    let abilities: Vec<String> = ability_preview(&record.abilities)
        .iter()
        .map(|a| capitalize(&humanize(a)))
        .collect();

    let mut lines = vec![
        Line::from(name),
        Line::from(type_badges(&record.types)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Height  ", palette.label),
            Span::styled(format!("{:.1} m", record.height_m()), palette.body),
            Span::styled("   Weight  ", palette.label),
            Span::styled(format!("{:.1} kg", record.weight_kg()), palette.body),
            Span::styled("   Base exp  ", palette.label),
            Span::styled(format_base_experience(record.base_experience), palette.body),
        ]),
        Line::from(vec![
            Span::styled("Abilities  ", palette.label),
            Span::styled(abilities.join(", "), palette.body),
        ]),
    ];
    if let Some(art) = record.sprites.primary() {
        lines.push(Line::from(vec![
            Span::styled("Artwork  ", palette.label),
            Span::styled(strip_control_chars(art).into_owned(), palette.muted),
        ]));
    }
    lines
}

fn species_lines(palette: &ColorPalette, species: &SpeciesRecord) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut meta = Vec::new();
    if let Some(genus) = &species.genus {
        meta.push(Span::styled(strip_control_chars(genus).into_owned(), palette.body));
    }
    if let Some(habitat) = &species.habitat {
        meta.push(Span::styled("   Habitat  ", palette.label));
        meta.push(Span::styled(capitalize(&humanize(habitat)), palette.body));
    }
    if !meta.is_empty() {
        lines.push(Line::from(meta));
    }
    if let Some(text) = &species.flavor_text {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            strip_control_chars(text).replace(['\n', '\r'], " "),
            palette.body,
        )));
    }
    lines
}

fn stat_lines(palette: &ColorPalette, record: &DetailRecord) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = section(palette, "Base stats").into();
    for stat in &record.stats {
        // Rounded so any non-zero stat shows at least part of a bar.
        let filled = (stat_ratio(stat.base) * BAR_WIDTH as f64).round() as usize;
        lines.push(Line::from(vec![
            Span::styled(format!("{:<7}", stat_label(&stat.name)), palette.label),
            Span::styled(format!("{:>4} ", stat.base), palette.body),
            Span::styled("█".repeat(filled), palette.stat_bar),
            Span::styled("░".repeat(BAR_WIDTH - filled), palette.muted),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled(format!("{:<7}", "Total"), palette.label),
        Span::styled(format!("{:>4}", record.stat_total()), palette.heading),
    ]));
    lines
}

fn evolution_lines(
    palette: &ColorPalette,
    chain: &EvolutionNode,
    current: &str,
    artwork: &HashMap<String, Option<String>>,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = section(palette, "Evolution").into();
    for (depth, node) in chain.walk() {
        let marker = if depth == 0 { "" } else { "└─ " };
        let style = if node.identifier == current {
            palette.evolution_current
        } else {
            palette.body
        };
        let art = match artwork.get(&node.identifier) {
            Some(Some(_)) => "  [art]",
            Some(None) => "",
            None => "  ...",
        };
        lines.push(Line::from(vec![
            Span::raw("   ".repeat(depth)),
            Span::styled(marker, palette.muted),
            Span::styled(capitalize(&node.identifier), style),
            Span::styled(art, palette.muted),
        ]));
    }
    lines
}

fn move_lines(palette: &ColorPalette, record: &DetailRecord) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = section(palette, "Moves").into();
    let (shown, rest) = move_preview(&record.moves);
    if shown.is_empty() {
        lines.push(Line::from(Span::styled("None recorded", palette.muted)));
        return lines;
    }
    let names: Vec<String> = shown.iter().map(|m| humanize(m)).collect();
    let mut spans = vec![Span::styled(names.join(", "), palette.body)];
    if rest > 0 {
        spans.push(Span::styled(format!("  +{} more", rest), palette.muted));
    }
    lines.push(Line::from(spans));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Stat;
    use crate::theme::ThemeVariant;

    fn text_of(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_wrapped_rows_counts_long_lines() {
        let lines = vec![Line::from("a".repeat(25)), Line::from(""), Line::from("short")];
        assert_eq!(wrapped_rows(&lines, 10), 5);
        assert_eq!(wrapped_rows(&lines, 0), 31);
    }

    #[test]
    fn test_stat_block_has_total() {
        let record = DetailRecord {
            stats: vec![
                Stat { name: "hp".to_string(), base: 35 },
                Stat { name: "speed".to_string(), base: 90 },
            ],
            ..DetailRecord::default()
        };
        let text = text_of(&stat_lines(&ThemeVariant::Dark.palette(), &record));
        assert!(text.contains("HP"));
        assert!(text.contains("SPD"));
        assert!(text.contains("125"));
    }

    #[test]
    fn test_max_stat_fills_bar() {
        let record = DetailRecord {
            stats: vec![Stat { name: "hp".to_string(), base: 255 }],
            ..DetailRecord::default()
        };
        let text = text_of(&stat_lines(&ThemeVariant::Dark.palette(), &record));
        assert!(text.contains(&"█".repeat(BAR_WIDTH)));
        assert!(!text.contains('░'));
    }

    #[test]
    fn test_moves_collapse_after_preview() {
        let record = DetailRecord {
            moves: (0..25).map(|i| format!("move-{i}")).collect(),
            ..DetailRecord::default()
        };
        let text = text_of(&move_lines(&ThemeVariant::Dark.palette(), &record));
        assert!(text.contains("move 19"));
        assert!(!text.contains("move 20"));
        assert!(text.contains("+5 more"));
    }

    #[test]
    fn test_evolution_tree_indents_and_marks_art() {
        let chain = EvolutionNode::with_children(
            "eevee",
            vec![EvolutionNode::leaf("vaporeon"), EvolutionNode::leaf("jolteon")],
        );
        let mut artwork = HashMap::new();
        artwork.insert("vaporeon".to_string(), Some("https://img/134.png".to_string()));
        artwork.insert("jolteon".to_string(), None);

        let text = text_of(&evolution_lines(
            &ThemeVariant::Dark.palette(),
            &chain,
            "vaporeon",
            &artwork,
        ));
        assert!(text.contains("Eevee  ..."));
        assert!(text.contains("   └─ Vaporeon  [art]"));
        assert!(text.lines().any(|l| l == "   └─ Jolteon"));
    }

    #[test]
    fn test_missing_base_experience() {
        let record = DetailRecord::default();
        let text = text_of(&header_lines(&ThemeVariant::Dark.palette(), &record, true));
        assert!(text.contains("Base exp  ---"));
        assert!(text.contains("♥"));
    }
}
