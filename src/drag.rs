//! Drag-to-reorder geometry.
//!
//! A [`DragSession`] is created when the user starts dragging a card.  It
//! snapshots the bounding box of every displayed card once, and all later
//! hit-testing and shift computation works against that snapshot.  Cards
//! move visually while the drag is in progress, so measuring them again
//! would make the drop target jump around under the pointer.
//!
//! # Insertion model
//!
//! Dropping the card taken from `from` at `target` is "remove, then insert".
//! Only the cards strictly between the two slots (plus the one at `target`)
//! move, each by one slot towards the gap:
//!
//! ```text
//! from = 2, target = 5         from = 5, target = 2
//!
//! idx:   0 1 2 3 4 5           idx:   0 1 2 3 4 5
//! slot:  0 1 * 2 3 4           slot:  0 1 3 4 5 *
//! ```
//!
//! A card's on-screen displacement is the vector from its own original rect
//! to the original rect of its new slot.

use crate::message::TabId;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether `(x, y)` lies inside the box.  Edges are inclusive.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }
}

/// Translation applied to a card relative to its laid-out position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0.0, dy: 0.0 };

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Visual displacement of one non-dragged card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardShift {
    /// Original display index of the card.
    pub index: usize,
    /// Slot the card appears in while the drag hovers the current target.
    pub slot: usize,
    pub offset: Offset,
}

/// Slot a card originally at `idx` occupies when the card from `from` is
/// reinserted at `target`.
pub fn visual_slot(from: usize, target: usize, idx: usize) -> usize {
    if from < target && idx > from && idx <= target {
        idx - 1
    } else if from > target && idx >= target && idx < from {
        idx + 1
    } else {
        idx
    }
}

/// First rect (in display order) containing the point, if any.
pub fn hit_test(rects: &[Rect], x: f64, y: f64) -> Option<usize> {
    rects.iter().position(|r| r.contains(x, y))
}

/// Compute the shift of every card except the dragged one.
///
/// Cards whose rect (or destination rect) is missing from the snapshot are
/// skipped.  Cards that stay in place get a zero offset so the surface can
/// clear any transform left over from an earlier target.
pub fn compute_shifts(rects: &[Rect], from: usize, target: usize) -> Vec<CardShift> {
    rects
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != from)
        .filter_map(|(idx, original)| {
            let slot = visual_slot(from, target, idx);
            let dest = rects.get(slot)?;
            Some(CardShift {
                index: idx,
                slot,
                offset: Offset {
                    dx: dest.left - original.left,
                    dy: dest.top - original.top,
                },
            })
        })
        .collect()
}

/// An in-progress drag gesture.
#[derive(Debug, Clone)]
pub struct DragSession {
    source: usize,
    target: usize,
    rects: Vec<Rect>,
    dragged: TabId,
}

impl DragSession {
    /// Start dragging the card at `source` (holding `dragged`).
    ///
    /// `rects` is the one-time snapshot of every displayed card.
    pub fn begin(source: usize, dragged: TabId, rects: Vec<Rect>) -> Self {
        Self {
            source,
            target: source,
            rects,
            dragged,
        }
    }

    pub fn source_index(&self) -> usize {
        self.source
    }

    pub fn target_index(&self) -> usize {
        self.target
    }

    pub fn dragged_tab(&self) -> TabId {
        self.dragged
    }

    pub fn original_rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Track the pointer.  Returns the new shifts if the target changed,
    /// `None` if the pointer is over the same card or over no card at all.
    pub fn update(&mut self, x: f64, y: f64) -> Option<Vec<CardShift>> {
        let target = hit_test(&self.rects, x, y)?;
        if target == self.target {
            return None;
        }
        self.target = target;
        Some(self.shifts())
    }

    /// Shifts for the current target.
    pub fn shifts(&self) -> Vec<CardShift> {
        compute_shifts(&self.rects, self.source, self.target)
    }

    /// Current shift of the card at `index` (zero for unshifted cards and the
    /// dragged card itself).
    pub fn offset_of(&self, index: usize) -> Offset {
        if index == self.source {
            return Offset::ZERO;
        }
        let slot = visual_slot(self.source, self.target, index);
        match (self.rects.get(index), self.rects.get(slot)) {
            (Some(original), Some(dest)) => Offset {
                dx: dest.left - original.left,
                dy: dest.top - original.top,
            },
            _ => Offset::ZERO,
        }
    }

    /// Whether dropping now would change the order.
    pub fn moved(&self) -> bool {
        self.target != self.source
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    /// A single row of `n` 100×80 cards with a 20px gap.
    fn row(n: usize) -> Vec<Rect> {
        (0..n)
            .map(|i| Rect::new(i as f64 * 120.0, 0.0, 100.0, 80.0))
            .collect()
    }

    /// `n` cards in a grid of `cols` columns, 100×80 with a 20px gap.
    fn grid(n: usize, cols: usize) -> Vec<Rect> {
        (0..n)
            .map(|i| {
                let (c, r) = (i % cols, i / cols);
                Rect::new(c as f64 * 120.0, r as f64 * 100.0, 100.0, 80.0)
            })
            .collect()
    }

    fn slots(from: usize, target: usize, n: usize) -> Vec<(usize, usize)> {
        compute_shifts(&row(n), from, target)
            .into_iter()
            .map(|s| (s.index, s.slot))
            .collect()
    }

    #[test]
    fn rect_contains_is_edge_inclusive() {
        let r = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(20.0, 20.0));
        assert!(!r.contains(20.1, 15.0));
        assert!(!r.contains(15.0, 9.9));
    }

    #[test]
    fn forward_drag_shifts_cards_back() {
        assert_eq!(
            slots(2, 5, 6),
            vec![(0, 0), (1, 1), (3, 2), (4, 3), (5, 4)]
        );
    }

    #[test]
    fn backward_drag_shifts_cards_forward() {
        assert_eq!(
            slots(5, 2, 6),
            vec![(0, 0), (1, 1), (2, 3), (3, 4), (4, 5)]
        );
    }

    #[test]
    fn no_shift_when_target_is_source() {
        assert!(compute_shifts(&row(4), 1, 1)
            .iter()
            .all(|s| s.slot == s.index && s.offset.is_zero()));
    }

    #[test]
    fn shift_offsets_follow_destination_rects() {
        let shifts = compute_shifts(&grid(6, 3), 0, 4);
        // Card 3 (col 0, row 1) moves to slot 2 (col 2, row 0).
        let s3 = shifts.iter().find(|s| s.index == 3).unwrap();
        assert_eq!(s3.slot, 2);
        assert_eq!(s3.offset, Offset { dx: 240.0, dy: -100.0 });
        // Card 5 is past the target and stays.
        let s5 = shifts.iter().find(|s| s.index == 5).unwrap();
        assert!(s5.offset.is_zero());
    }

    #[test]
    fn dragged_card_is_excluded() {
        assert!(compute_shifts(&row(4), 2, 0).iter().all(|s| s.index != 2));
    }

    #[test]
    fn hit_test_first_match_wins() {
        let rects = vec![
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(100.0, 0.0, 100.0, 100.0),
        ];
        // x = 100 lies on the shared edge of both.
        assert_eq!(hit_test(&rects, 100.0, 50.0), Some(0));
        assert_eq!(hit_test(&rects, 150.0, 50.0), Some(1));
        assert_eq!(hit_test(&rects, 500.0, 50.0), None);
    }

    #[test]
    fn session_tracks_target() {
        let mut d = DragSession::begin(0, TabId(1), row(3));
        assert_eq!(d.target_index(), 0);
        assert!(!d.moved());

        let shifts = d.update(250.0, 40.0).expect("target changed");
        assert_eq!(d.target_index(), 2);
        assert!(d.moved());
        assert_eq!(shifts.len(), 2);

        // Same card again: nothing to recompute.
        assert!(d.update(260.0, 40.0).is_none());
    }

    #[test]
    fn pointer_in_gap_keeps_target() {
        let mut d = DragSession::begin(0, TabId(1), row(3));
        d.update(130.0, 40.0);
        assert_eq!(d.target_index(), 1);
        // Gap between card 1 (ends at 220) and card 2 (starts at 240).
        assert!(d.update(230.0, 40.0).is_none());
        assert_eq!(d.target_index(), 1);
        // Below every card.
        assert!(d.update(130.0, 500.0).is_none());
        assert_eq!(d.target_index(), 1);
    }

    #[test]
    fn offset_of_matches_shifts() {
        let mut d = DragSession::begin(1, TabId(9), grid(7, 3));
        d.update(10.0, 210.0); // card 6
        for s in d.shifts() {
            assert_eq!(d.offset_of(s.index), s.offset);
        }
        assert_eq!(d.offset_of(1), Offset::ZERO);
    }

    #[test]
    fn missing_rects_are_skipped() {
        // Snapshot only covers two of the cards.
        let shifts = compute_shifts(&row(2), 0, 1);
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].offset, Offset { dx: -120.0, dy: 0.0 });
    }
}
