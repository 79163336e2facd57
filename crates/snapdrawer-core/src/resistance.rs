#![forbid(unsafe_code)]

//! Boundary resistance ("rubber-banding") at the panel's travel limits.
//!
//! Inside `[min, max]` the proposed height passes through unchanged. Past a
//! limit, the overshoot `e` is replaced by the saturating curve
//!
//!   f(e) = e / (1 + k·e)
//!
//! which starts with slope 1 (no kink at the boundary), grows ever more
//! slowly, and never reaches `1 / k`. The lower limit uses a stronger `k`
//! than the upper one: pulling past collapsed should feel stiff, stretching
//! past expanded more elastic.
//!
//! # Invariants
//!
//! 1. Monotonic non-decreasing in the proposed height.
//! 2. Continuous everywhere, including at `min` and `max`.
//! 3. Result lies in `(min - 1/k_low, max + 1/k_high)` for finite input.

/// Saturating resistance for both travel limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResistanceCurve {
    low: f64,
    high: f64,
}

impl Default for ResistanceCurve {
    fn default() -> Self {
        Self {
            low: 0.02,
            high: 0.01,
        }
    }
}

impl ResistanceCurve {
    /// Strengths below `min` and above `max`. Non-positive values are
    /// replaced with a tiny positive strength so the excursion stays bounded.
    #[must_use]
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low: low.max(f64::EPSILON),
            high: high.max(f64::EPSILON),
        }
    }

    /// Furthest the result can fall below `min`.
    #[inline]
    #[must_use]
    pub fn max_excursion_low(&self) -> f64 {
        1.0 / self.low
    }

    /// Furthest the result can rise above `max`.
    #[inline]
    #[must_use]
    pub fn max_excursion_high(&self) -> f64 {
        1.0 / self.high
    }

    /// Map a proposed height to its resisted height.
    #[must_use]
    pub fn apply(&self, proposed: f64, min: f64, max: f64) -> f64 {
        if proposed < min {
            min - damp(min - proposed, self.low)
        } else if proposed > max {
            max + damp(proposed - max, self.high)
        } else {
            proposed
        }
    }
}

#[inline]
fn damp(excess: f64, k: f64) -> f64 {
    excess / (1.0 + k * excess)
}

/// Resist with the default curve.
#[must_use]
pub fn resist(proposed: f64, min: f64, max: f64) -> f64 {
    ResistanceCurve::default().apply(proposed, min, max)
}
