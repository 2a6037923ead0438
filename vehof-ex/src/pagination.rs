//! Incremental pagination ("show more")
//!
//! The visible window starts at one increment and grows by one increment
//! per request. It never shrinks while the query is stable and returns to
//! the initial size whenever the query changes.

/// Default items added per "show more"
pub const PAGE_INCREMENT: usize = 60;

/// Visible-window state for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    increment: usize,
    visible: usize,
}

impl Pager {
    /// Pager showing one increment; a zero increment is raised to 1
    pub fn new(increment: usize) -> Self {
        let increment = increment.max(1);
        Self {
            increment,
            visible: increment,
        }
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    /// Grow by one increment; returns the new window size
    pub fn show_more(&mut self) -> usize {
        self.visible = self.visible.saturating_add(self.increment);
        self.visible
    }

    pub fn reset(&mut self) {
        self.visible = self.increment;
    }

    /// True when a result of `total` items has rows beyond the window
    pub fn has_more(&self, total: usize) -> bool {
        total > self.visible
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(PAGE_INCREMENT)
    }
}
