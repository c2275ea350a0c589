/// Number of entries shown right after any filter change.
pub const INITIAL_WINDOW: usize = 20;
/// Entries revealed each time the end-of-list sentinel comes into view.
pub const WINDOW_INCREMENT: usize = 20;

/// How many filtered entries are currently revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayWindow {
    displayed_count: usize,
}

impl Default for DisplayWindow {
    fn default() -> Self {
        Self {
            displayed_count: INITIAL_WINDOW,
        }
    }
}

impl DisplayWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.displayed_count = INITIAL_WINDOW;
    }

    /// Reveal the next increment, capped at `total`. Returns whether the
    /// window changed.
    pub fn grow(&mut self, total: usize) -> bool {
        if !self.can_grow(total) {
            return false;
        }
        self.displayed_count = (self.displayed_count + WINDOW_INCREMENT).min(total);
        true
    }

    pub fn can_grow(&self, total: usize) -> bool {
        self.displayed_count < total
    }

    /// Entries actually visible for a filtered list of `total` entries.
    pub fn visible_len(&self, total: usize) -> usize {
        self.displayed_count.min(total)
    }

    pub fn displayed_count(&self) -> usize {
        self.displayed_count
    }
}
