//! A display surface with no pixels.
//!
//! [`HeadlessSurface`] consumes [`SurfaceEvent`]s the way a real overlay
//! would: it fades in and out, remembers which card is selected and glides
//! shifted cards to their offsets along the `ease` curve.  Nothing is drawn;
//! the binaries log what it shows, and tests query it directly.
//!
//! Time is passed in explicitly, so the state machine can be driven from a
//! timer loop or stepped deterministically.

use crate::animation::ShiftTween;
use crate::drag::Offset;
use crate::render::Frame;
use crate::traits::SurfaceEvent;
use log::{debug, info};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks the fade-in → visible → fade-out → hidden lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    /// Opacity is being animated from 0 → 1.
    FadingIn { since: Instant, duration: Duration },
    Visible,
    /// Opacity is being animated from 1 → 0.
    FadingOut { since: Instant, duration: Duration },
}

fn fraction(since: Instant, duration: Duration, now: Instant) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    (now.saturating_duration_since(since).as_secs_f64() / duration.as_secs_f64()).min(1.0)
}

/// Surface that keeps state instead of drawing.
#[derive(Debug)]
pub struct HeadlessSurface {
    visibility: Visibility,
    frame: Option<Frame>,
    selected: Option<usize>,
    /// Offsets the cards are at (or heading to).
    offsets: HashMap<usize, Offset>,
    tween: Option<ShiftTween>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            visibility: Visibility::Hidden,
            frame: None,
            selected: None,
            offsets: HashMap::new(),
            tween: None,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether anything is on screen, including fades.
    pub fn is_shown(&self) -> bool {
        self.visibility != Visibility::Hidden
    }

    /// The frame currently on screen.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// The card scrolled into view last.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
            || matches!(
                self.visibility,
                Visibility::FadingIn { .. } | Visibility::FadingOut { .. }
            )
    }

    /// Overlay opacity at `now`.
    pub fn opacity(&self, now: Instant) -> f64 {
        match self.visibility {
            Visibility::Hidden => 0.0,
            Visibility::Visible => 1.0,
            Visibility::FadingIn { since, duration } => fraction(since, duration, now),
            Visibility::FadingOut { since, duration } => 1.0 - fraction(since, duration, now),
        }
    }

    /// Where every displaced card is drawn at `now`.
    pub fn offsets(&self, now: Instant) -> HashMap<usize, Offset> {
        match &self.tween {
            Some(tween) => tween.sample(now),
            None => self
                .offsets
                .iter()
                .filter(|(_, o)| !o.is_zero())
                .map(|(i, o)| (*i, *o))
                .collect(),
        }
    }

    /// Apply one event from the engine.
    pub fn apply(&mut self, event: SurfaceEvent, now: Instant) {
        match event {
            SurfaceEvent::Show { frame, fade_in_ms } => {
                info!(
                    "SHOW {} card(s), ~{} MB{}",
                    frame.header.tab_count,
                    frame.header.estimated_ram_mb,
                    if frame.is_empty() {
                        format!(" ({})", Frame::EMPTY_MESSAGE)
                    } else {
                        String::new()
                    }
                );
                self.selected = frame.selected().map(|c| c.index);
                self.frame = Some(frame);
                self.clear_offsets();
                self.visibility = if fade_in_ms == 0 {
                    Visibility::Visible
                } else {
                    Visibility::FadingIn {
                        since: now,
                        duration: Duration::from_millis(fade_in_ms),
                    }
                };
            }
            SurfaceEvent::Render(frame) => {
                debug!("RENDER {} card(s)", frame.cards.len());
                self.selected = frame.selected().map(|c| c.index);
                self.frame = Some(frame);
                self.clear_offsets();
            }
            SurfaceEvent::Select(index) => {
                if let Some(card) = self.frame.as_ref().and_then(|f| f.cards.get(index)) {
                    debug!("SELECT {} \"{}\"", index, card.title);
                }
                self.selected = Some(index);
            }
            SurfaceEvent::Shift {
                shifts,
                duration_ms,
            } => {
                let from = self.offsets(now);
                let to: HashMap<usize, Offset> = shifts
                    .iter()
                    .filter(|s| !s.offset.is_zero())
                    .map(|s| (s.index, s.offset))
                    .collect();
                debug!("SHIFT {} card(s) over {}ms", to.len(), duration_ms);
                self.tween = Some(ShiftTween::new(
                    from,
                    to.clone(),
                    now,
                    Duration::from_millis(duration_ms),
                ));
                self.offsets = to;
            }
            SurfaceEvent::ClearShifts => {
                debug!("CLEAR SHIFTS");
                self.clear_offsets();
            }
            SurfaceEvent::Hide { fade_out_ms } => {
                if self.visibility == Visibility::Hidden {
                    return;
                }
                info!("HIDE (fade {}ms)", fade_out_ms);
                if fade_out_ms == 0 {
                    self.finish_hide();
                } else {
                    self.visibility = Visibility::FadingOut {
                        since: now,
                        duration: Duration::from_millis(fade_out_ms),
                    };
                }
            }
        }
    }

    /// Advance animations to `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.tween.as_ref().is_some_and(|t| t.is_finished(now)) {
            self.tween = None;
        }
        match self.visibility {
            Visibility::Hidden | Visibility::Visible => {}
            Visibility::FadingIn { since, duration } => {
                if fraction(since, duration, now) >= 1.0 {
                    self.visibility = Visibility::Visible;
                }
            }
            Visibility::FadingOut { since, duration } => {
                if fraction(since, duration, now) >= 1.0 {
                    self.finish_hide();
                }
            }
        }
    }

    fn clear_offsets(&mut self) {
        self.offsets.clear();
        self.tween = None;
    }

    fn finish_hide(&mut self) {
        self.visibility = Visibility::Hidden;
        self.frame = None;
        self.selected = None;
        self.clear_offsets();
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::drag::CardShift;
    use crate::message::tab;
    use crate::state::OverlayState;

    fn frame(n: u64) -> Frame {
        let mut s = OverlayState::new();
        s.init_selection((1..=n).map(|i| tab(i, 1, i as i64 - 1)).collect());
        Frame::render(&s, None, &OverlayConfig::default())
    }

    fn ms(t0: Instant, n: u64) -> Instant {
        t0 + Duration::from_millis(n)
    }

    fn shift(index: usize, dx: f64) -> CardShift {
        CardShift {
            index,
            slot: index,
            offset: Offset { dx, dy: 0.0 },
        }
    }

    #[test]
    fn fades_in_then_out() {
        let t0 = Instant::now();
        let mut s = HeadlessSurface::new();
        s.apply(SurfaceEvent::Show { frame: frame(3), fade_in_ms: 200 }, t0);
        assert!(matches!(s.visibility(), Visibility::FadingIn { .. }));
        assert!((s.opacity(ms(t0, 100)) - 0.5).abs() < 1e-9);

        s.tick(ms(t0, 200));
        assert_eq!(s.visibility(), Visibility::Visible);
        assert_eq!(s.selected(), Some(0));

        s.apply(SurfaceEvent::Hide { fade_out_ms: 100 }, ms(t0, 300));
        assert!(s.is_shown());
        assert!((s.opacity(ms(t0, 350)) - 0.5).abs() < 1e-9);
        s.tick(ms(t0, 400));
        assert_eq!(s.visibility(), Visibility::Hidden);
        assert!(s.frame().is_none());
    }

    #[test]
    fn zero_durations_are_instant() {
        let t0 = Instant::now();
        let mut s = HeadlessSurface::new();
        s.apply(SurfaceEvent::Show { frame: frame(1), fade_in_ms: 0 }, t0);
        assert_eq!(s.visibility(), Visibility::Visible);
        s.apply(SurfaceEvent::Hide { fade_out_ms: 0 }, t0);
        assert_eq!(s.visibility(), Visibility::Hidden);
    }

    #[test]
    fn hide_while_hidden_is_ignored() {
        let mut s = HeadlessSurface::new();
        s.apply(SurfaceEvent::Hide { fade_out_ms: 200 }, Instant::now());
        assert_eq!(s.visibility(), Visibility::Hidden);
    }

    #[test]
    fn shifts_glide_and_settle() {
        let t0 = Instant::now();
        let mut s = HeadlessSurface::new();
        s.apply(SurfaceEvent::Show { frame: frame(3), fade_in_ms: 0 }, t0);
        s.apply(
            SurfaceEvent::Shift { shifts: vec![shift(1, -100.0), shift(2, 0.0)], duration_ms: 400 },
            t0,
        );
        assert!(s.is_animating());

        let mid = s.offsets(ms(t0, 200));
        let dx = mid[&1].dx;
        assert!(dx < 0.0 && dx > -100.0, "mid-flight offset {dx}");
        assert!(!mid.contains_key(&2));

        s.tick(ms(t0, 400));
        assert!(!s.is_animating());
        assert_eq!(s.offsets(ms(t0, 400))[&1], Offset { dx: -100.0, dy: 0.0 });
    }

    #[test]
    fn retarget_starts_from_current_position() {
        let t0 = Instant::now();
        let mut s = HeadlessSurface::new();
        s.apply(SurfaceEvent::Show { frame: frame(3), fade_in_ms: 0 }, t0);
        s.apply(SurfaceEvent::Shift { shifts: vec![shift(1, -100.0)], duration_ms: 400 }, t0);
        let at = ms(t0, 200);
        let before = s.offsets(at)[&1];
        // Target moves back: card 1 returns home from where it is now.
        s.apply(SurfaceEvent::Shift { shifts: vec![shift(1, 0.0)], duration_ms: 400 }, at);
        assert_eq!(s.offsets(at)[&1], before);
        s.tick(ms(t0, 600));
        assert!(s.offsets(ms(t0, 600)).is_empty());
    }

    #[test]
    fn clear_shifts_is_immediate() {
        let t0 = Instant::now();
        let mut s = HeadlessSurface::new();
        s.apply(SurfaceEvent::Show { frame: frame(3), fade_in_ms: 0 }, t0);
        s.apply(SurfaceEvent::Shift { shifts: vec![shift(1, -100.0)], duration_ms: 400 }, t0);
        s.apply(SurfaceEvent::ClearShifts, ms(t0, 100));
        assert!(s.offsets(ms(t0, 100)).is_empty());
        assert!(!s.is_animating());
    }

    #[test]
    fn select_and_render_track_cursor() {
        let t0 = Instant::now();
        let mut s = HeadlessSurface::new();
        s.apply(SurfaceEvent::Show { frame: frame(3), fade_in_ms: 0 }, t0);
        s.apply(SurfaceEvent::Select(2), t0);
        assert_eq!(s.selected(), Some(2));
        s.apply(SurfaceEvent::Render(frame(5)), t0);
        assert_eq!(s.frame().map(|f| f.cards.len()), Some(5));
        assert_eq!(s.selected(), Some(0));
    }
}
