//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values. The
//! persisted [`ThemePreference`] resolves to a concrete [`ThemeVariant`];
//! `system` follows the terminal background reported in `COLORFGBG`.

use ratatui::style::{Color, Modifier, Style};

use crate::preferences::ThemePreference;

// ============================================================================
// Theme Variant
// ============================================================================

/// Concrete palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Resolve a stored preference. `System` reads the terminal background
    /// from `colorfgbg` (the `COLORFGBG` value) and falls back to dark.
    pub fn resolve(pref: ThemePreference, colorfgbg: Option<&str>) -> Self {
        match pref {
            ThemePreference::Light => Self::Light,
            ThemePreference::Dark => Self::Dark,
            ThemePreference::System => colorfgbg
                .and_then(Self::from_colorfgbg)
                .unwrap_or(Self::Dark),
        }
    }

    /// Resolve against the current process environment.
    pub fn detect(pref: ThemePreference) -> Self {
        let colorfgbg = std::env::var("COLORFGBG").ok();
        Self::resolve(pref, colorfgbg.as_deref())
    }

    /// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`). Backgrounds 7 and
    /// 9-15 are light ANSI colors.
    fn from_colorfgbg(value: &str) -> Option<Self> {
        let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        Some(if bg == 7 || (9..=15).contains(&bg) {
            Self::Light
        } else {
            Self::Dark
        })
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette: semantic roles to Style
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Card list --
    pub card_name: Style,
    pub card_id: Style,
    pub card_selected: Style,
    pub favorite: Style,
    pub sentinel: Style,

    // -- Detail --
    pub heading: Style,
    pub label: Style,
    pub body: Style,
    pub muted: Style,
    pub stat_bar: Style,
    pub evolution_current: Style,

    // -- States --
    pub loading: Style,
    pub error: Style,
    pub empty: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub search_active: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub overlay_border: Style,
    pub overlay_selected: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            card_name: Style::default().add_modifier(Modifier::BOLD),
            card_id: Style::default().fg(Color::DarkGray),
            card_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            favorite: Style::default().fg(Color::Red),
            sentinel: Style::default().fg(Color::DarkGray),

            heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            body: Style::default(),
            muted: Style::default().fg(Color::DarkGray),
            stat_bar: Style::default().fg(Color::Cyan),
            evolution_current: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),

            loading: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            empty: Style::default().fg(Color::Gray),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            search_active: Style::default().fg(Color::Yellow),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            overlay_border: Style::default().fg(Color::Cyan),
            overlay_selected: Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        }
    }

    fn light() -> Self {
        Self {
            card_name: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            card_id: Style::default().fg(Color::DarkGray),
            card_selected: Style::default().bg(Color::Blue).fg(Color::White),
            favorite: Style::default().fg(Color::Red),
            sentinel: Style::default().fg(Color::DarkGray),

            heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            body: Style::default().fg(Color::Black),
            muted: Style::default().fg(Color::DarkGray),
            stat_bar: Style::default().fg(Color::Blue),
            evolution_current: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            loading: Style::default().fg(Color::Magenta),
            error: Style::default().fg(Color::Red),
            empty: Style::default().fg(Color::DarkGray),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            search_active: Style::default().fg(Color::Magenta),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            overlay_border: Style::default().fg(Color::Blue),
            overlay_selected: Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        }
    }
}

// ============================================================================
// Category Colors
// ============================================================================

/// The eighteen categories in filter-bar order, with their display colors.
pub const CATEGORY_COLORS: [(&str, Color); 18] = [
    ("normal", Color::Rgb(0xA8, 0xA7, 0x7A)),
    ("fire", Color::Rgb(0xEE, 0x81, 0x30)),
    ("water", Color::Rgb(0x63, 0x90, 0xF0)),
    ("electric", Color::Rgb(0xF7, 0xD0, 0x2C)),
    ("grass", Color::Rgb(0x7A, 0xC7, 0x4C)),
    ("ice", Color::Rgb(0x96, 0xD9, 0xD6)),
    ("fighting", Color::Rgb(0xC2, 0x2E, 0x28)),
    ("poison", Color::Rgb(0xA3, 0x3E, 0xA1)),
    ("ground", Color::Rgb(0xE2, 0xBF, 0x65)),
    ("flying", Color::Rgb(0xA9, 0x8F, 0xF3)),
    ("psychic", Color::Rgb(0xF9, 0x55, 0x87)),
    ("bug", Color::Rgb(0xA6, 0xB9, 0x1A)),
    ("rock", Color::Rgb(0xB6, 0xA1, 0x36)),
    ("ghost", Color::Rgb(0x73, 0x57, 0x97)),
    ("dragon", Color::Rgb(0x6F, 0x35, 0xFC)),
    ("dark", Color::Rgb(0x70, 0x57, 0x46)),
    ("steel", Color::Rgb(0xB7, 0xB7, 0xCE)),
    ("fairy", Color::Rgb(0xD6, 0x85, 0xAD)),
];

/// Display color for a category; gray for anything unknown.
pub fn category_color(name: &str) -> Color {
    CATEGORY_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
        .unwrap_or(Color::Gray)
}

/// Category names in filter-bar order.
pub fn category_names() -> impl Iterator<Item = &'static str> {
    CATEGORY_COLORS.iter().map(|(n, _)| *n)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_preferences_ignore_terminal() {
        assert_eq!(
            ThemeVariant::resolve(ThemePreference::Light, Some("15;0")),
            ThemeVariant::Light
        );
        assert_eq!(
            ThemeVariant::resolve(ThemePreference::Dark, Some("0;15")),
            ThemeVariant::Dark
        );
    }

    #[test]
    fn system_follows_colorfgbg() {
        assert_eq!(
            ThemeVariant::resolve(ThemePreference::System, Some("0;15")),
            ThemeVariant::Light
        );
        assert_eq!(
            ThemeVariant::resolve(ThemePreference::System, Some("15;default;0")),
            ThemeVariant::Dark
        );
        assert_eq!(
            ThemeVariant::resolve(ThemePreference::System, Some("0;7")),
            ThemeVariant::Light
        );
    }

    #[test]
    fn system_defaults_to_dark() {
        assert_eq!(
            ThemeVariant::resolve(ThemePreference::System, None),
            ThemeVariant::Dark
        );
        assert_eq!(
            ThemeVariant::resolve(ThemePreference::System, Some("garbage")),
            ThemeVariant::Dark
        );
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.card_selected, light.card_selected);
        assert_ne!(dark.status_bar, light.status_bar);
    }

    #[test]
    fn eighteen_unique_categories() {
        let mut names: Vec<_> = category_names().collect();
        assert_eq!(names.len(), 18);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 18);
    }

    #[test]
    fn category_color_lookup() {
        assert_eq!(category_color("fire"), Color::Rgb(0xEE, 0x81, 0x30));
        assert_eq!(category_color("shadow"), Color::Gray);
    }
}
