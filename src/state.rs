//! Overlay state and the selection state machine.
//!
//! [`OverlayState`] owns the displayed tab list, the selection cursor and
//! the visibility flag.  The cards are laid out row-major in a grid whose
//! column count depends on the viewport, so horizontal movement wraps
//! around the whole list while vertical movement clamps at the first and
//! last card.
//!
//! None of the methods here render anything; the engine re-reads the state
//! after every transition.

use crate::message::TabRecord;

/// Everything the content-side engine knows about the overlay.
#[derive(Debug, Clone, Default)]
pub struct OverlayState {
    /// Displayed tabs; display index == position in this vector.
    tabs: Vec<TabRecord>,
    /// Index of the focused card.  Always `< tabs.len()` unless the list is
    /// empty, in which case it is `0`.
    selected: usize,
    /// Whether the overlay is currently shown.
    visible: bool,
}

impl OverlayState {
    /// Create an empty, hidden state.
    pub fn new() -> Self {
        Self::default()
    }

    //  Accessors

    pub fn tabs(&self) -> &[TabRecord] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Index of the selected card.
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The selected tab, if the list is non-empty.
    pub fn selected_tab(&self) -> Option<&TabRecord> {
        self.tabs.get(self.selected)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    //  Selection transitions

    /// Replace the list and select the active tab (or the first one).
    pub fn init_selection(&mut self, tabs: Vec<TabRecord>) {
        self.selected = tabs.iter().position(|t| t.is_active).unwrap_or(0);
        self.tabs = tabs;
    }

    /// Select the next card, wrapping to the first.
    pub fn move_next(&mut self) -> usize {
        if !self.tabs.is_empty() {
            self.selected = (self.selected + 1) % self.tabs.len();
        }
        self.selected
    }

    /// Select the previous card, wrapping to the last.
    pub fn move_prev(&mut self) -> usize {
        if !self.tabs.is_empty() {
            let len = self.tabs.len();
            self.selected = (self.selected + len - 1) % len;
        }
        self.selected
    }

    /// Move one row down, stopping at the last card.
    pub fn move_down(&mut self, columns: usize) -> usize {
        if !self.tabs.is_empty() {
            let step = columns.max(1);
            self.selected = (self.selected + step).min(self.tabs.len() - 1);
        }
        self.selected
    }

    /// Move one row up, stopping at the first card.
    pub fn move_up(&mut self, columns: usize) -> usize {
        if !self.tabs.is_empty() {
            self.selected = self.selected.saturating_sub(columns.max(1));
        }
        self.selected
    }

    /// Replace the list after an external change, keeping the cursor where
    /// it was unless it fell off the end.
    ///
    /// Returns `false` if the new list is empty (the overlay must close).
    pub fn on_list_changed(&mut self, tabs: Vec<TabRecord>) -> bool {
        self.tabs = tabs;
        if self.selected >= self.tabs.len() {
            self.selected = self.tabs.len().saturating_sub(1);
        }
        !self.tabs.is_empty()
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::tab;

    fn tabs(n: u64) -> Vec<TabRecord> {
        (0..n).map(|i| tab(i + 1, 1, i as i64)).collect()
    }

    #[test]
    fn new_state_is_hidden_and_empty() {
        let s = OverlayState::new();
        assert!(!s.is_visible());
        assert!(s.is_empty());
        assert_eq!(s.selected_index(), 0);
        assert!(s.selected_tab().is_none());
    }

    #[test]
    fn init_selects_active_tab() {
        let mut list = tabs(4);
        list[2].is_active = true;
        let mut s = OverlayState::new();
        s.init_selection(list);
        assert_eq!(s.selected_index(), 2);
    }

    #[test]
    fn init_without_active_selects_first() {
        let mut s = OverlayState::new();
        s.init_selection(tabs(3));
        assert_eq!(s.selected_index(), 0);
        s.init_selection(vec![]);
        assert_eq!(s.selected_index(), 0);
    }

    #[test]
    fn next_wraps_around() {
        let mut list = tabs(3);
        list[0].is_active = true;
        let mut s = OverlayState::new();
        s.init_selection(list);
        assert_eq!(s.selected_index(), 0);
        assert_eq!(s.move_next(), 1);
        assert_eq!(s.move_next(), 2);
        assert_eq!(s.move_next(), 0);
    }

    #[test]
    fn prev_wraps_around() {
        let mut s = OverlayState::new();
        s.init_selection(tabs(3));
        assert_eq!(s.move_prev(), 2);
        assert_eq!(s.move_prev(), 1);
    }

    #[test]
    fn navigation_on_empty_list_is_noop() {
        let mut s = OverlayState::new();
        assert_eq!(s.move_next(), 0);
        assert_eq!(s.move_prev(), 0);
        assert_eq!(s.move_down(4), 0);
        assert_eq!(s.move_up(4), 0);
    }

    #[test]
    fn vertical_moves_clamp() {
        let mut s = OverlayState::new();
        s.init_selection(tabs(10));
        assert_eq!(s.move_down(4), 4);
        assert_eq!(s.move_down(4), 8);
        assert_eq!(s.move_down(4), 9, "clamped to last card");
        assert_eq!(s.move_up(4), 5);
        assert_eq!(s.move_up(4), 1);
        assert_eq!(s.move_up(4), 0, "clamped to first card");
    }

    #[test]
    fn zero_columns_moves_one_step() {
        let mut s = OverlayState::new();
        s.init_selection(tabs(3));
        assert_eq!(s.move_down(0), 1);
        assert_eq!(s.move_up(0), 0);
    }

    #[test]
    fn shrinking_list_clamps_selection() {
        let mut s = OverlayState::new();
        s.init_selection(tabs(5));
        s.move_prev(); // 4
        assert!(s.on_list_changed(tabs(2)));
        assert_eq!(s.selected_index(), 1);
    }

    #[test]
    fn growing_list_keeps_selection() {
        let mut s = OverlayState::new();
        s.init_selection(tabs(3));
        s.move_next();
        assert!(s.on_list_changed(tabs(6)));
        assert_eq!(s.selected_index(), 1);
    }

    #[test]
    fn empty_update_reports_close() {
        let mut s = OverlayState::new();
        s.init_selection(tabs(3));
        s.move_next();
        assert!(!s.on_list_changed(vec![]));
        assert_eq!(s.selected_index(), 0);
    }
}
