//! Timing curves and the height tween driven by the accordion.
//!
//! Curves are CSS-style cubic beziers anchored at (0,0) and (1,1). The
//! solver inverts x(t) with a few Newton steps and falls back to
//! bisection when the slope flattens out.

use serde::{Deserialize, Serialize};

use crate::ACCORDION_DURATION_MS;

const NEWTON_ITERATIONS: usize = 8;
const NEWTON_MIN_SLOPE: f64 = 1e-3;
const SOLVE_PRECISION: f64 = 1e-7;
const BISECTION_MAX_ITERATIONS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CubicBezier {
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn coefficients(p1: f64, p2: f64) -> (f64, f64, f64) {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        let a = 1.0 - c - b;
        (a, b, c)
    }

    fn sample(p1: f64, p2: f64, t: f64) -> f64 {
        let (a, b, c) = Self::coefficients(p1, p2);
        ((a * t + b) * t + c) * t
    }

    fn slope(p1: f64, p2: f64, t: f64) -> f64 {
        let (a, b, c) = Self::coefficients(p1, p2);
        (3.0 * a * t + 2.0 * b) * t + c
    }

    fn solve_t(&self, x: f64) -> f64 {
        let mut t = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = Self::sample(self.x1, self.x2, t) - x;
            if err.abs() < SOLVE_PRECISION {
                return t;
            }
            let slope = Self::slope(self.x1, self.x2, t);
            if slope.abs() < NEWTON_MIN_SLOPE {
                break;
            }
            t -= err / slope;
        }

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        t = x;
        for _ in 0..BISECTION_MAX_ITERATIONS {
            let value = Self::sample(self.x1, self.x2, t);
            if (value - x).abs() < SOLVE_PRECISION {
                break;
            }
            if value < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) / 2.0;
        }
        t
    }

    /// Maps linear progress in `[0, 1]` to eased progress.
    #[must_use]
    pub fn apply(&self, progress: f64) -> f64 {
        if !progress.is_finite() {
            return 0.0;
        }
        let x = progress.clamp(0.0, 1.0);
        if x <= 0.0 || x >= 1.0 {
            return x;
        }
        Self::sample(self.y1, self.y2, self.solve_t(x))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Linear,
    /// React Native's `Easing.ease`: accelerates, then stops hard.
    Ease,
    #[default]
    EaseInOut,
    Bezier(CubicBezier),
}

impl Curve {
    const EASE: CubicBezier = CubicBezier::new(0.42, 0.0, 1.0, 1.0);
    const EASE_IN_OUT: CubicBezier = CubicBezier::new(0.42, 0.0, 0.58, 1.0);

    #[must_use]
    pub fn apply(&self, progress: f64) -> f64 {
        match self {
            Self::Linear => {
                if progress.is_finite() {
                    progress.clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
            Self::Ease => Self::EASE.apply(progress),
            Self::EaseInOut => Self::EASE_IN_OUT.apply(progress),
            Self::Bezier(bezier) => bezier.apply(progress),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub duration_ms: f64,
    pub curve: Curve,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            duration_ms: ACCORDION_DURATION_MS,
            curve: Curve::EaseInOut,
        }
    }
}

/// One timed interpolation between two heights on the shell's frame clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    from: f64,
    to: f64,
    started_at_ms: f64,
    timing: Timing,
}

impl Tween {
    #[must_use]
    pub fn new(from: f64, to: f64, started_at_ms: f64, timing: Timing) -> Self {
        Self {
            from,
            to,
            started_at_ms,
            timing,
        }
    }

    #[must_use]
    pub const fn from(&self) -> f64 {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> f64 {
        self.to
    }

    #[must_use]
    pub const fn started_at_ms(&self) -> f64 {
        self.started_at_ms
    }

    /// Linear progress at `at_ms`. Timestamps before the start read as 0.
    #[must_use]
    pub fn progress_at(&self, at_ms: f64) -> f64 {
        if !at_ms.is_finite() {
            return 0.0;
        }
        if self.timing.duration_ms <= 0.0 || !self.started_at_ms.is_finite() {
            return 1.0;
        }
        ((at_ms - self.started_at_ms) / self.timing.duration_ms).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn value_at(&self, at_ms: f64) -> f64 {
        let eased = self.timing.curve.apply(self.progress_at(at_ms));
        self.from + (self.to - self.from) * eased
    }

    #[must_use]
    pub fn is_finished_at(&self, at_ms: f64) -> bool {
        self.progress_at(at_ms) >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_are_anchored_at_both_ends() {
        for curve in [Curve::Linear, Curve::Ease, Curve::EaseInOut] {
            assert_eq!(curve.apply(0.0), 0.0);
            assert_eq!(curve.apply(1.0), 1.0);
            assert_eq!(curve.apply(-3.0), 0.0);
            assert_eq!(curve.apply(7.0), 1.0);
            assert_eq!(curve.apply(f64::NAN), 0.0);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_around_midpoint() {
        let mid = Curve::EaseInOut.apply(0.5);
        assert!((mid - 0.5).abs() < 1e-4, "midpoint was {mid}");

        let early = Curve::EaseInOut.apply(0.2);
        let late = Curve::EaseInOut.apply(0.8);
        assert!((early + late - 1.0).abs() < 1e-4);
        assert!(early < 0.2, "ease-in-out should start slow");
    }

    #[test]
    fn ease_in_out_is_monotonic() {
        let mut previous = 0.0;
        for step in 1..=100 {
            let value = Curve::EaseInOut.apply(f64::from(step) / 100.0);
            assert!(value >= previous - 1e-9);
            previous = value;
        }
    }

    #[test]
    fn tween_interpolates_over_duration() {
        let timing = Timing {
            duration_ms: 600.0,
            curve: Curve::Linear,
        };
        let tween = Tween::new(0.0, 200.0, 1_000.0, timing);

        assert_eq!(tween.value_at(900.0), 0.0);
        assert_eq!(tween.value_at(1_000.0), 0.0);
        assert!((tween.value_at(1_300.0) - 100.0).abs() < 1e-9);
        assert_eq!(tween.value_at(1_600.0), 200.0);
        assert!(tween.is_finished_at(1_600.0));
        assert!(!tween.is_finished_at(1_599.0));
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let timing = Timing {
            duration_ms: 0.0,
            curve: Curve::EaseInOut,
        };
        let tween = Tween::new(40.0, 0.0, 10.0, timing);
        assert!(tween.is_finished_at(10.0));
        assert_eq!(tween.value_at(10.0), 0.0);
    }

    #[test]
    fn unknown_start_reads_as_finished() {
        let tween = Tween::new(0.0, 120.0, f64::NAN, Timing::default());
        assert!(tween.is_finished_at(5.0));
        assert_eq!(tween.value_at(5.0), 120.0);
    }
}
