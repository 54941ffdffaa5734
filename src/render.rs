//! Pure view model of the overlay.
//!
//! [`Frame::render`] turns the engine's state (and the drag session, if one
//! is active) into everything a surface needs to draw the grid.  It reads
//! no surface state and has no side effects, so the same inputs always
//! produce the same frame.

use crate::config::OverlayConfig;
use crate::drag::{DragSession, Offset};
use crate::message::{GroupId, TabId};
use crate::state::OverlayState;
use serde::Serialize;

/// How a card's icon is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CardIcon {
    /// Load the favicon from this reference.
    Image(String),
    /// No favicon: draw this letter in a rounded box.
    Placeholder(char),
}

impl CardIcon {
    /// Placeholder letter for `title`: its first character uppercased, or
    /// `?` for an empty title.
    pub fn placeholder_for(title: &str) -> Self {
        let letter = title
            .trim()
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('?');
        CardIcon::Placeholder(letter)
    }
}

/// One tab card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub index: usize,
    pub tab_id: TabId,
    pub group_id: GroupId,
    pub title: String,
    pub icon: CardIcon,
    /// Keyboard cursor is on this card.
    pub selected: bool,
    /// The host reports this tab as the active one.
    pub active: bool,
    /// This card is being dragged.
    pub dragging: bool,
    /// Shift applied while another card is dragged.
    pub offset: Offset,
}

/// Header statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub tab_count: usize,
    pub estimated_ram_mb: u64,
}

/// A complete render of the overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub header: HeaderView,
    /// Empty when there are no tabs; the surface shows an empty-state
    /// message instead of the grid.
    pub cards: Vec<CardView>,
}

impl Frame {
    pub const EMPTY_MESSAGE: &'static str = "No tabs found";

    /// Build the frame for `state`, applying the shifts of `drag`.
    pub fn render(state: &OverlayState, drag: Option<&DragSession>, config: &OverlayConfig) -> Self {
        let cards = state
            .tabs()
            .iter()
            .enumerate()
            .map(|(index, tab)| {
                let title = tab.display_title().to_string();
                let icon = match &tab.icon_ref {
                    Some(src) => CardIcon::Image(src.clone()),
                    None => CardIcon::placeholder_for(&tab.title),
                };
                let dragging = drag.is_some_and(|d| d.source_index() == index);
                let offset = drag.map(|d| d.offset_of(index)).unwrap_or(Offset::ZERO);
                CardView {
                    index,
                    tab_id: tab.id,
                    group_id: tab.group_id,
                    title,
                    icon,
                    selected: index == state.selected_index(),
                    active: tab.is_active,
                    dragging,
                    offset,
                }
            })
            .collect::<Vec<_>>();

        let tab_count = cards.len();
        Self {
            header: HeaderView {
                tab_count,
                estimated_ram_mb: tab_count as u64 * config.estimated_ram_per_tab_mb,
            },
            cards,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn selected(&self) -> Option<&CardView> {
        self.cards.iter().find(|c| c.selected)
    }
}
