//! Keybinding registry: maps key events to actions, with config overrides.
//!
//! Bindings are data, not match arms, so `[keybindings]` in config.toml can
//! move any action to another key.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    Top,
    Bottom,
    Select,
    Back,
    EnterSearch,
    ExitSearch,
    NextCategory,
    PrevCategory,
    ClearCategory,
    ToggleFavorite,
    ToggleSettings,
    ToggleSound,
    CycleTheme,
    Retry,
    ScrollDown,
    ScrollUp,
    ShowHelp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Next entry",
            Self::NavUp => "Previous entry",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::Top => "Jump to first entry",
            Self::Bottom => "Jump to last loaded entry",
            Self::Select => "Open detail / confirm",
            Self::Back => "Go back / dismiss",
            Self::EnterSearch => "Search by name",
            Self::ExitSearch => "Leave search input",
            Self::NextCategory => "Next type filter",
            Self::PrevCategory => "Previous type filter",
            Self::ClearCategory => "Clear type filter",
            Self::ToggleFavorite => "Toggle favorite",
            Self::ToggleSettings => "Settings panel",
            Self::ToggleSound => "Toggle sound",
            Self::CycleTheme => "Cycle theme",
            Self::Retry => "Retry failed request",
            Self::ScrollDown => "Scroll down",
            Self::ScrollUp => "Scroll up",
            Self::ShowHelp => "Show help",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    List,
    Detail,
    Search,
    Settings,
}

impl Context {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::List => "Catalog",
            Self::Detail => "Detail",
            Self::Search => "Search",
            Self::Settings => "Settings",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Accepts single characters (`"f"`, `"/"`), named keys (`"Enter"`, `"Esc"`,
/// `"Space"`, `"PageDown"`...), `Ctrl+<char>` and `F1`..`F12`.
pub fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        let c = chars.next()?;
        return chars.next().is_none().then(|| KeySpec::ctrl(c));
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "backtab" => Some(KeyCode::BackTab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "pageup" | "pgup" => Some(KeyCode::PageUp),
        "pagedown" | "pgdn" => Some(KeyCode::PageDown),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|rest| rest.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then(|| KeySpec::ch(c))
}

/// Format a KeySpec as a human-readable string for the help screen.
pub fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; a
/// context binding shadows the global one.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Registration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn bind_all(&mut self, context: Context, keys: &[KeySpec], action: Action) {
        for key in keys {
            self.bind(context, *key, action);
        }
    }

    fn register_defaults(&mut self) {
        use Context::*;

        // === Global ===
        self.bind_all(Global, &[KeySpec::ch('q'), KeySpec::ctrl('c')], Action::Quit);
        self.bind_all(
            Global,
            &[KeySpec::ch('j'), KeySpec::plain(KeyCode::Down)],
            Action::NavDown,
        );
        self.bind_all(
            Global,
            &[KeySpec::ch('k'), KeySpec::plain(KeyCode::Up)],
            Action::NavUp,
        );
        self.bind_all(
            Global,
            &[KeySpec::plain(KeyCode::PageDown), KeySpec::ctrl('d')],
            Action::PageDown,
        );
        self.bind_all(
            Global,
            &[KeySpec::plain(KeyCode::PageUp), KeySpec::ctrl('u')],
            Action::PageUp,
        );
        self.bind(Global, KeySpec::ch(','), Action::ToggleSettings);
        self.bind(Global, KeySpec::ch('m'), Action::ToggleSound);
        self.bind(Global, KeySpec::ch('t'), Action::CycleTheme);
        self.bind(Global, KeySpec::ch('?'), Action::ShowHelp);
        self.bind(Global, KeySpec::plain(KeyCode::Esc), Action::Back);

        // === Catalog list ===
        self.bind(List, KeySpec::plain(KeyCode::Enter), Action::Select);
        self.bind(List, KeySpec::ch('/'), Action::EnterSearch);
        self.bind_all(
            List,
            &[KeySpec::plain(KeyCode::Tab), KeySpec::ch(']')],
            Action::NextCategory,
        );
        self.bind_all(
            List,
            &[KeySpec::plain(KeyCode::BackTab), KeySpec::ch('[')],
            Action::PrevCategory,
        );
        self.bind(List, KeySpec::ch('x'), Action::ClearCategory);
        self.bind(List, KeySpec::ch('f'), Action::ToggleFavorite);
        self.bind(List, KeySpec::ch('r'), Action::Retry);
        self.bind_all(
            List,
            &[KeySpec::ch('g'), KeySpec::plain(KeyCode::Home)],
            Action::Top,
        );
        self.bind_all(
            List,
            &[KeySpec::ch('G'), KeySpec::plain(KeyCode::End)],
            Action::Bottom,
        );

        // === Detail view ===
        self.bind_all(
            Detail,
            &[KeySpec::ch('b'), KeySpec::plain(KeyCode::Backspace)],
            Action::Back,
        );
        self.bind_all(
            Detail,
            &[KeySpec::ch('j'), KeySpec::plain(KeyCode::Down)],
            Action::ScrollDown,
        );
        self.bind_all(
            Detail,
            &[KeySpec::ch('k'), KeySpec::plain(KeyCode::Up)],
            Action::ScrollUp,
        );
        self.bind(Detail, KeySpec::ch('f'), Action::ToggleFavorite);
        self.bind(Detail, KeySpec::ch('r'), Action::Retry);

        // === Search input ===
        self.bind(Search, KeySpec::plain(KeyCode::Esc), Action::ExitSearch);
        self.bind(Search, KeySpec::plain(KeyCode::Enter), Action::ExitSearch);

        // === Settings overlay ===
        self.bind_all(
            Settings,
            &[KeySpec::plain(KeyCode::Enter), KeySpec::ch(' ')],
            Action::Select,
        );
        self.bind_all(
            Settings,
            &[KeySpec::ch(','), KeySpec::plain(KeyCode::Esc)],
            Action::ToggleSettings,
        );
    }

    /// Apply user overrides from config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "favorite").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5"). An overridden
    /// action keeps every context it was bound in but loses its default keys.
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a given key in a given context.
    ///
    /// Tries the specific context first, then falls back to Global. Search
    /// input never falls back: printable keys there are text.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        // Shift is implied by the character itself ('G', '?').
        let modifiers = if matches!(code, KeyCode::Char(_) | KeyCode::BackTab) {
            modifiers.difference(KeyModifiers::SHIFT)
        } else {
            modifiers
        };
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }

        match context {
            Context::Global => None,
            Context::Search => (modifiers.contains(KeyModifiers::CONTROL))
                .then(|| self.lookup.get(&(Context::Global, key)).copied())
                .flatten(),
            _ => self.lookup.get(&(Context::Global, key)).copied(),
        }
    }

    /// All bindings for the help screen, in registration order.
    ///
    /// Returns (context, key_display_string, action, description) tuples.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }

    /// First key bound to `action` in `context` (or Global), for status hints.
    pub fn key_hint(&self, action: Action, context: Context) -> Option<String> {
        self.bindings
            .iter()
            .find(|(c, _, a)| *a == action && *c == context)
            .or_else(|| {
                self.bindings
                    .iter()
                    .find(|(c, _, a)| *a == action && *c == Context::Global)
            })
            .map(|(_, key, _)| format_key(key))
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "down" => Some(Action::NavDown),
        "nav_up" | "up" => Some(Action::NavUp),
        "page_down" | "pagedown" => Some(Action::PageDown),
        "page_up" | "pageup" => Some(Action::PageUp),
        "top" | "first" => Some(Action::Top),
        "bottom" | "last" => Some(Action::Bottom),
        "select" | "open" | "enter" => Some(Action::Select),
        "back" => Some(Action::Back),
        "search" | "enter_search" => Some(Action::EnterSearch),
        "exit_search" => Some(Action::ExitSearch),
        "next_type" | "next_category" => Some(Action::NextCategory),
        "prev_type" | "prev_category" => Some(Action::PrevCategory),
        "clear_type" | "clear_category" => Some(Action::ClearCategory),
        "favorite" | "toggle_favorite" => Some(Action::ToggleFavorite),
        "settings" | "toggle_settings" => Some(Action::ToggleSettings),
        "sound" | "toggle_sound" => Some(Action::ToggleSound),
        "theme" | "cycle_theme" => Some(Action::CycleTheme),
        "retry" => Some(Action::Retry),
        "scroll_down" => Some(Action::ScrollDown),
        "scroll_up" => Some(Action::ScrollUp),
        "help" | "show_help" => Some(Action::ShowHelp),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(reg: &KeybindingRegistry, code: KeyCode, ctx: Context) -> Option<Action> {
        reg.action_for_key(code, KeyModifiers::NONE, ctx)
    }

    #[test]
    fn test_default_registry_has_quit() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::Char('q'), Context::Global), Some(Action::Quit));
        assert_eq!(
            reg.action_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL, Context::Search),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_list_falls_back_to_global_navigation() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::Char('j'), Context::List), Some(Action::NavDown));
        assert_eq!(lookup(&reg, KeyCode::Up, Context::List), Some(Action::NavUp));
        assert_eq!(lookup(&reg, KeyCode::Enter, Context::List), Some(Action::Select));
    }

    #[test]
    fn test_detail_context_overrides_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            lookup(&reg, KeyCode::Char('j'), Context::Detail),
            Some(Action::ScrollDown)
        );
        assert_eq!(lookup(&reg, KeyCode::Char('b'), Context::Detail), Some(Action::Back));
        // Esc comes from Global in detail.
        assert_eq!(lookup(&reg, KeyCode::Esc, Context::Detail), Some(Action::Back));
    }

    #[test]
    fn test_search_context_does_not_steal_text() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::Char('q'), Context::Search), None);
        assert_eq!(lookup(&reg, KeyCode::Char('f'), Context::Search), None);
        assert_eq!(lookup(&reg, KeyCode::Esc, Context::Search), Some(Action::ExitSearch));
        assert_eq!(lookup(&reg, KeyCode::Enter, Context::Search), Some(Action::ExitSearch));
    }

    #[test]
    fn test_shifted_characters_match() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('G'), KeyModifiers::SHIFT, Context::List),
            Some(Action::Bottom)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('?'), KeyModifiers::SHIFT, Context::List),
            Some(Action::ShowHelp)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::BackTab, KeyModifiers::SHIFT, Context::List),
            Some(Action::PrevCategory)
        );
    }

    #[test]
    fn test_settings_keys() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::Char(' '), Context::Settings), Some(Action::Select));
        assert_eq!(
            lookup(&reg, KeyCode::Esc, Context::Settings),
            Some(Action::ToggleSettings)
        );
        assert_eq!(lookup(&reg, KeyCode::Char('j'), Context::Settings), Some(Action::NavDown));
    }

    #[test]
    fn test_favorite_only_in_list_and_detail() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            lookup(&reg, KeyCode::Char('f'), Context::List),
            Some(Action::ToggleFavorite)
        );
        assert_eq!(lookup(&reg, KeyCode::Char('f'), Context::Settings), None);
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::F(12), Context::Global), None);
    }

    #[test]
    fn test_apply_overrides_valid() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("quit".to_string(), "F10".to_string());

        let warnings = reg.apply_overrides(&overrides);
        assert!(warnings.is_empty());

        assert_eq!(lookup(&reg, KeyCode::Char('q'), Context::Global), None);
        assert_eq!(lookup(&reg, KeyCode::F(10), Context::Global), Some(Action::Quit));
    }

    #[test]
    fn test_override_preserves_contexts() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("favorite".to_string(), "Space".to_string());
        assert!(reg.apply_overrides(&overrides).is_empty());

        assert_eq!(
            lookup(&reg, KeyCode::Char(' '), Context::List),
            Some(Action::ToggleFavorite)
        );
        assert_eq!(
            lookup(&reg, KeyCode::Char(' '), Context::Detail),
            Some(Action::ToggleFavorite)
        );
        assert_eq!(lookup(&reg, KeyCode::Char('f'), Context::List), None);
    }

    #[test]
    fn test_apply_overrides_warnings() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("teleport".to_string(), "q".to_string());
        overrides.insert("retry".to_string(), "Ctrl+Alt+Shift+R".to_string());

        let mut warnings = reg.apply_overrides(&overrides);
        warnings.sort();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Cannot parse key"));
        assert!(warnings[1].contains("Unknown action"));
    }

    #[test]
    fn test_parse_key_string_variants() {
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_string("esc"), Some(KeySpec::plain(KeyCode::Esc)));
        assert_eq!(parse_key_string("PageDown"), Some(KeySpec::plain(KeyCode::PageDown)));
        assert_eq!(parse_key_string("space"), Some(KeySpec::ch(' ')));
        assert_eq!(parse_key_string("F1"), Some(KeySpec::plain(KeyCode::F(1))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("f"), Some(KeySpec::ch('f')));
        assert_eq!(parse_key_string("Ctrl+d"), Some(KeySpec::ctrl('d')));
        assert_eq!(parse_key_string("Ctrl+dd"), None);
        assert_eq!(parse_key_string("é"), Some(KeySpec::ch('é')));
        assert_eq!(parse_key_string(""), None);
    }

    #[test]
    fn test_format_key_display() {
        assert_eq!(format_key(&KeySpec::ch('q')), "q");
        assert_eq!(format_key(&KeySpec::ch(' ')), "Space");
        assert_eq!(format_key(&KeySpec::ctrl('d')), "Ctrl+d");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::F(5))), "F5");
    }

    #[test]
    fn test_key_hint_prefers_context() {
        let reg = KeybindingRegistry::new();
        assert_eq!(reg.key_hint(Action::Back, Context::Detail).as_deref(), Some("b"));
        assert_eq!(reg.key_hint(Action::ShowHelp, Context::List).as_deref(), Some("?"));
        assert_eq!(reg.key_hint(Action::Select, Context::Detail), None);
    }

    #[test]
    fn test_all_bindings_describe() {
        let reg = KeybindingRegistry::new();
        let bindings = reg.all_bindings();
        assert!(bindings
            .iter()
            .any(|(ctx, key, _, desc)| *ctx == Context::List
                && key == "f"
                && *desc == "Toggle favorite"));
    }
}
