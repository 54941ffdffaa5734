//! CSS-style cubic Bézier timing and card shift tweening.
//!
//! Shifted cards glide to their new slot using the same curve as the
//! stylesheet transition (`cubic-bezier(0.25, 0.1, 0.25, 1)`, i.e. CSS
//! `ease`).  [`ShiftTween`] holds the start and end offsets of every card so
//! a surface can sample the in-between positions on each frame.

use crate::drag::Offset;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A CSS timing function with control points (0,0), (x1,y1), (x2,y2), (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CubicBezier {
    /// CSS `ease`.
    pub const EASE: CubicBezier = CubicBezier {
        x1: 0.25,
        y1: 0.10,
        x2: 0.25,
        y2: 1.00,
    };

    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Polynomial coefficients `(a, b, c)` of `a t³ + b t² + c t` for one axis.
    fn coefficients(p1: f64, p2: f64) -> (f64, f64, f64) {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        let a = 1.0 - c - b;
        (a, b, c)
    }

    /// Eased progress for normalised time `u` in `[0, 1]`.
    pub fn progress(&self, u: f64) -> f64 {
        if u <= 0.0 {
            return 0.0;
        }
        if u >= 1.0 {
            return 1.0;
        }
        let (ax, bx, cx) = Self::coefficients(self.x1, self.x2);
        let (ay, by, cy) = Self::coefficients(self.y1, self.y2);
        let t = solve_t_for_x(u, ax, bx, cx);
        ((ay * t + by) * t + cy) * t
    }

    /// Interpolate from `a` to `b` at normalised time `u`.
    pub fn interpolate(&self, a: f64, b: f64, u: f64) -> f64 {
        a + (b - a) * self.progress(u)
    }
}

/// Solve `x(t) = u` for `t` in `[0, 1]`: Newton-Raphson first, bisection if
/// it wanders off.
fn solve_t_for_x(u: f64, ax: f64, bx: f64, cx: f64) -> f64 {
    let mut t = u;
    for _ in 0..8 {
        let x = ((ax * t + bx) * t + cx) * t - u;
        if x.abs() < 1e-7 {
            return t;
        }
        let dx = (3.0 * ax * t + 2.0 * bx) * t + cx;
        if dx.abs() < 1e-7 {
            break;
        }
        t -= x / dx;
        if !(0.0..=1.0).contains(&t) {
            break;
        }
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = u;
    for _ in 0..32 {
        let x = ((ax * t + bx) * t + cx) * t;
        if (x - u).abs() < 1e-9 {
            return t;
        }
        if x < u {
            lo = t;
        } else {
            hi = t;
        }
        t = 0.5 * (lo + hi);
    }
    t
}

/// Animates a set of cards from their current offsets to new ones.
#[derive(Debug, Clone)]
pub struct ShiftTween {
    from: HashMap<usize, Offset>,
    to: HashMap<usize, Offset>,
    start: Instant,
    duration: Duration,
    curve: CubicBezier,
}

impl ShiftTween {
    /// Start a tween at `start`.  Cards present in only one of the maps
    /// animate from / to [`Offset::ZERO`].
    pub fn new(
        from: HashMap<usize, Offset>,
        to: HashMap<usize, Offset>,
        start: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            curve: CubicBezier::EASE,
        }
    }

    /// Normalised time at `now`.
    fn elapsed_fraction(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.elapsed_fraction(now) >= 1.0
    }

    /// Offsets of every animated card at `now`.  Cards that have come to
    /// rest at zero are left out.
    pub fn sample(&self, now: Instant) -> HashMap<usize, Offset> {
        let u = self.elapsed_fraction(now);
        self.from
            .keys()
            .chain(self.to.keys())
            .filter_map(|idx| {
                let a = self.from.get(idx).copied().unwrap_or(Offset::ZERO);
                let b = self.to.get(idx).copied().unwrap_or(Offset::ZERO);
                let offset = Offset {
                    dx: self.curve.interpolate(a.dx, b.dx, u),
                    dy: self.curve.interpolate(a.dy, b.dy, u),
                };
                (!offset.is_zero()).then_some((*idx, offset))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_hits_endpoints() {
        let e = CubicBezier::EASE;
        assert!(e.progress(0.0).abs() < 1e-6);
        assert!((e.progress(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ease_is_monotonic_and_front_loaded() {
        let e = CubicBezier::EASE;
        let mut prev = 0.0;
        for i in 1..=20 {
            let p = e.progress(i as f64 / 20.0);
            assert!(p >= prev - 1e-9, "not monotonic at step {}", i);
            prev = p;
        }
        // CSS `ease` is well past half-way at half time.
        assert!(e.progress(0.5) > 0.7);
    }

    #[test]
    fn linear_curve_is_identity() {
        let linear = CubicBezier::new(0.0, 0.0, 1.0, 1.0);
        for u in [0.1, 0.25, 0.5, 0.9] {
            assert!((linear.progress(u) - u).abs() < 1e-4);
        }
    }

    #[test]
    fn out_of_range_time_is_clamped() {
        let e = CubicBezier::EASE;
        assert_eq!(e.interpolate(10.0, 20.0, -1.0), 10.0);
        assert!((e.interpolate(10.0, 20.0, 2.0) - 20.0).abs() < 1e-6);
    }

    #[test]
    fn tween_reaches_target() {
        let start = Instant::now();
        let to: HashMap<usize, Offset> = [(3, Offset { dx: -120.0, dy: 0.0 })].into();
        let tween = ShiftTween::new(HashMap::new(), to.clone(), start, Duration::from_millis(400));

        let mid = tween.sample(start + Duration::from_millis(200));
        let dx = mid[&3].dx;
        assert!(dx < 0.0 && dx > -120.0, "mid-flight dx = {}", dx);

        let end = start + Duration::from_millis(400);
        assert!(tween.is_finished(end));
        assert_eq!(tween.sample(end), to);
    }

    #[test]
    fn tween_back_to_zero_drops_cards() {
        let start = Instant::now();
        let from: HashMap<usize, Offset> = [(1, Offset { dx: 0.0, dy: 100.0 })].into();
        let tween = ShiftTween::new(from, HashMap::new(), start, Duration::from_millis(100));
        assert!(tween.sample(start + Duration::from_millis(100)).is_empty());
    }

    #[test]
    fn zero_duration_is_instant() {
        let start = Instant::now();
        let to: HashMap<usize, Offset> = [(0, Offset { dx: 5.0, dy: 5.0 })].into();
        let tween = ShiftTween::new(HashMap::new(), to.clone(), start, Duration::ZERO);
        assert!(tween.is_finished(start));
        assert_eq!(tween.sample(start), to);
    }
}
