#![forbid(unsafe_code)]

//! Derived presentation: secondary signals computed from the panel height.
//!
//! Renderers never read raw panel internals to decide how the panel looks.
//! They read [`PresentationSignals`], a stateless view recomputed from the
//! height (and, for blur, the phase) on every change.
//!
//! # Mappings
//!
//! All numeric signals are clamped piecewise-linear interpolations over
//! `[collapsed, expanded]`:
//!
//! | Signal | Stops |
//! |--------|-------|
//! | `content_opacity` | 0 at collapsed, 0.3 at collapsed+30, 1 at expanded |
//! | `backdrop_opacity` | 0 at collapsed, 0.1 at collapsed+50, 0.3 at expanded |
//! | `background_alpha` | 0.7 → 0.8 |
//! | `search_scale` | 0.98 → 1.0 |
//! | `handle_width` | 36 → 48 |
//! | `handle_color` | rgb(239, 68, 68) → rgb(74, 93, 79) |
//!
//! `blur_intensity` sits at its rest level while idle and rises toward the
//! active level in proportion to the distance from the nearest snap point
//! while dragging or settling.
//!
//! # Invariants
//!
//! 1. Every numeric signal is continuous in `height`.
//! 2. `blur_intensity` is continuous across phase changes, because an idle
//!    panel always sits exactly on a snap point.
//! 3. Opacities lie in [0, 1].
//! 4. Intermediate stops are pulled inside the travel range when the snap
//!    points are close together, so stops stay ordered.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::phase::Phase;
use crate::snap::SnapPoints;

/// An RGB color with continuous channels in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Component-wise linear blend, `t` clamped to [0, 1].
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: lerp(self.r, other.r, t),
            g: lerp(self.g, other.g, t),
            b: lerp(self.b, other.b, t),
        }
    }

    /// Rounded 8-bit channels.
    #[must_use]
    pub fn to_u8(self) -> [u8; 3] {
        [self.r, self.g, self.b].map(|c| c.round().clamp(0.0, 255.0) as u8)
    }
}

/// Tunable ranges for the derived signals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PresentationConfig {
    /// Height above collapsed over which content fades to `content_reveal_opacity`.
    pub content_reveal_span: f64,
    pub content_reveal_opacity: f64,
    /// Height above collapsed at which the backdrop becomes visible.
    pub backdrop_reveal_span: f64,
    pub backdrop_min_opacity: f64,
    pub backdrop_max_opacity: f64,
    pub background_alpha: (f64, f64),
    pub search_scale: (f64, f64),
    pub handle_width: (f64, f64),
    pub handle_color_collapsed: Rgb,
    pub handle_color_expanded: Rgb,
    pub blur_rest: f64,
    pub blur_active: f64,
    /// Distance from the nearest snap point at which blur reaches `blur_active`.
    pub blur_ramp: f64,
    /// Scrolling is enabled within this band below expanded.
    pub scroll_enable_band: f64,
    /// The collapsed summary row shows within this band above collapsed.
    pub summary_band: f64,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            content_reveal_span: 30.0,
            content_reveal_opacity: 0.3,
            backdrop_reveal_span: 50.0,
            backdrop_min_opacity: 0.1,
            backdrop_max_opacity: 0.3,
            background_alpha: (0.7, 0.8),
            search_scale: (0.98, 1.0),
            handle_width: (36.0, 48.0),
            handle_color_collapsed: Rgb::new(239.0, 68.0, 68.0),
            handle_color_expanded: Rgb::new(74.0, 93.0, 79.0),
            blur_rest: 40.0,
            blur_active: 80.0,
            blur_ramp: 50.0,
            scroll_enable_band: 50.0,
            summary_band: 20.0,
        }
    }
}

impl PresentationConfig {
    pub(crate) fn validate(&self, errors: &mut Vec<String>) {
        for (name, value) in [
            ("presentation.content_reveal_span", self.content_reveal_span),
            ("presentation.backdrop_reveal_span", self.backdrop_reveal_span),
            ("presentation.scroll_enable_band", self.scroll_enable_band),
            ("presentation.summary_band", self.summary_band),
            ("presentation.blur_rest", self.blur_rest),
            ("presentation.blur_active", self.blur_active),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be finite and >= 0, got {value}"));
            }
        }
        for (name, value) in [
            ("presentation.content_reveal_opacity", self.content_reveal_opacity),
            ("presentation.backdrop_min_opacity", self.backdrop_min_opacity),
            ("presentation.backdrop_max_opacity", self.backdrop_max_opacity),
            ("presentation.background_alpha.0", self.background_alpha.0),
            ("presentation.background_alpha.1", self.background_alpha.1),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        if !self.blur_ramp.is_finite() || self.blur_ramp <= 0.0 {
            errors.push(format!(
                "presentation.blur_ramp must be finite and > 0, got {}",
                self.blur_ramp
            ));
        }
    }
}

/// Stateless view of how the panel should look at a given height.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PresentationSignals {
    /// Height to lay the container out at; never below collapsed.
    pub layout_height: f64,
    pub content_opacity: f64,
    pub backdrop_opacity: f64,
    pub backdrop_visible: bool,
    pub background_alpha: f64,
    pub blur_intensity: f64,
    pub search_scale: f64,
    pub handle_width: f64,
    pub handle_color: Rgb,
    pub scroll_enabled: bool,
    pub summary_visible: bool,
}

impl PresentationSignals {
    /// Derive every signal from `height` and `phase`.
    #[must_use]
    pub fn derive(
        height: f64,
        phase: Phase,
        points: &SnapPoints,
        config: &PresentationConfig,
    ) -> Self {
        let lo = points.collapsed();
        let hi = points.expanded();
        let progress = interpolate(height, &[lo, hi], &[0.0, 1.0]);

        let content_stop = inner_stop(points, config.content_reveal_span);
        let backdrop_stop = inner_stop(points, config.backdrop_reveal_span);

        let activity = if phase.is_moving() {
            (points.distance_to_nearest(height) / config.blur_ramp).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            layout_height: height.max(lo),
            content_opacity: interpolate(
                height,
                &[lo, content_stop, hi],
                &[0.0, config.content_reveal_opacity, 1.0],
            ),
            backdrop_opacity: interpolate(
                height,
                &[lo, backdrop_stop, hi],
                &[0.0, config.backdrop_min_opacity, config.backdrop_max_opacity],
            ),
            backdrop_visible: height > lo + config.backdrop_reveal_span,
            background_alpha: lerp(config.background_alpha.0, config.background_alpha.1, progress),
            blur_intensity: lerp(config.blur_rest, config.blur_active, activity),
            search_scale: lerp(config.search_scale.0, config.search_scale.1, progress),
            handle_width: lerp(config.handle_width.0, config.handle_width.1, progress),
            handle_color: config
                .handle_color_collapsed
                .lerp(config.handle_color_expanded, progress),
            scroll_enabled: height >= hi - config.scroll_enable_band,
            summary_visible: height <= lo + config.summary_band,
        }
    }
}

/// Intermediate stop `span` above collapsed, kept inside the travel range.
fn inner_stop(points: &SnapPoints, span: f64) -> f64 {
    points.collapsed() + span.min(points.travel() * 0.5)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamped piecewise-linear interpolation.
///
/// `input` must be non-decreasing and the same length as `output`. Below the
/// first stop the first output is returned; above the last, the last output.
/// Zero-width segments are skipped.
#[must_use]
pub fn interpolate(x: f64, input: &[f64], output: &[f64]) -> f64 {
    debug_assert_eq!(input.len(), output.len());
    let n = input.len().min(output.len());
    if n == 0 {
        return 0.0;
    }
    if x <= input[0] {
        return output[0];
    }
    if x >= input[n - 1] {
        return output[n - 1];
    }
    for i in 1..n {
        let (x0, x1) = (input[i - 1], input[i]);
        if x <= x1 {
            let width = x1 - x0;
            if width <= 0.0 {
                return output[i];
            }
            return lerp(output[i - 1], output[i], (x - x0) / width);
        }
    }
    output[n - 1]
}
