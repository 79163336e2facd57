#![forbid(unsafe_code)]

//! Snap points and end-of-gesture resolution.
//!
//! A panel has exactly two rest positions, [`SnapPoint::Collapsed`] and
//! [`SnapPoint::Expanded`]. [`SnapPoints`] maps them to heights for the
//! current viewport; [`SnapResolver`] decides which one a released gesture
//! settles on.
//!
//! # Resolution order
//!
//! 1. Neither the release speed nor the travelled distance exceeds its
//!    threshold: keep the starting snap point. Jitter never moves the panel.
//! 2. The release speed exceeds the velocity threshold: the sign decides.
//!    Negative (toward larger) resolves to `Expanded`, positive (toward
//!    smaller) to `Collapsed`, regardless of the current height.
//! 3. Otherwise compare the height to the midpoint of the two snap heights:
//!    below resolves to `Collapsed`, at or above to `Expanded`.
//!
//! Only the final sample's velocity is consulted. A flick followed by a
//! pause before release takes the positional path.
//!
//! # Invariants
//!
//! 1. `SnapPoints` always satisfies `collapsed < expanded`; constructors
//!    refuse anything else.
//! 2. For `|velocity| > velocity_threshold`, the result depends only on the
//!    sign of the velocity.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, DrawerConfig, ExpandedHeight};

/// A named rest position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SnapPoint {
    /// Small fixed height showing the handle and a summary.
    #[default]
    Collapsed,
    /// Large fraction of the viewport.
    Expanded,
}

impl SnapPoint {
    /// The other snap point.
    #[inline]
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Collapsed => Self::Expanded,
            Self::Expanded => Self::Collapsed,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::Expanded => "expanded",
        }
    }
}

impl std::fmt::Display for SnapPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heights of both snap points. Always strictly ordered.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SnapPoints {
    collapsed: f64,
    expanded: f64,
}

impl SnapPoints {
    /// Build from explicit heights.
    pub fn new(collapsed: f64, expanded: f64) -> Result<Self, ConfigError> {
        if !collapsed.is_finite() || !expanded.is_finite() {
            return Err(ConfigError::Validation(vec![format!(
                "snap heights must be finite, got collapsed={collapsed} expanded={expanded}"
            )]));
        }
        if collapsed >= expanded {
            return Err(ConfigError::Validation(vec![format!(
                "collapsed height ({collapsed}) must be < expanded height ({expanded})"
            )]));
        }
        Ok(Self {
            collapsed,
            expanded,
        })
    }

    /// Resolve the expanded rule against a viewport and build.
    pub fn for_viewport(
        collapsed: f64,
        expanded: ExpandedHeight,
        viewport_height: f64,
    ) -> Result<Self, ConfigError> {
        if !viewport_height.is_finite() || viewport_height <= 0.0 {
            return Err(ConfigError::Validation(vec![format!(
                "viewport height must be finite and > 0, got {viewport_height}"
            )]));
        }
        Self::new(collapsed, expanded.resolve(viewport_height))
    }

    #[inline]
    #[must_use]
    pub fn collapsed(&self) -> f64 {
        self.collapsed
    }

    #[inline]
    #[must_use]
    pub fn expanded(&self) -> f64 {
        self.expanded
    }

    /// Height of a snap point.
    #[inline]
    #[must_use]
    pub fn height_of(&self, point: SnapPoint) -> f64 {
        match point {
            SnapPoint::Collapsed => self.collapsed,
            SnapPoint::Expanded => self.expanded,
        }
    }

    /// Midpoint between the two snap heights.
    #[inline]
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.collapsed + self.expanded) / 2.0
    }

    /// Distance from `height` to the closest snap height.
    #[must_use]
    pub fn distance_to_nearest(&self, height: f64) -> f64 {
        (height - self.collapsed)
            .abs()
            .min((height - self.expanded).abs())
    }

    /// Total travel between the snap points.
    #[inline]
    #[must_use]
    pub fn travel(&self) -> f64 {
        self.expanded - self.collapsed
    }
}

/// The panel's state at the moment a gesture is released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseState {
    /// Panel height at release.
    pub height: f64,
    /// Final pointer velocity (px/s). Positive means the panel is shrinking.
    pub velocity: f64,
    /// Absolute pointer distance since the gesture started (px).
    pub distance: f64,
    /// Snap point the gesture started from.
    pub start: SnapPoint,
}

/// Decides the rest position for a released gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResolver {
    velocity_threshold: f64,
    distance_threshold: f64,
}

impl SnapResolver {
    #[must_use]
    pub fn new(velocity_threshold: f64, distance_threshold: f64) -> Self {
        Self {
            velocity_threshold: velocity_threshold.abs(),
            distance_threshold: distance_threshold.abs(),
        }
    }

    #[must_use]
    pub fn from_config(config: &DrawerConfig) -> Self {
        Self::new(config.velocity_threshold, config.distance_threshold)
    }

    #[inline]
    #[must_use]
    pub fn velocity_threshold(&self) -> f64 {
        self.velocity_threshold
    }

    #[inline]
    #[must_use]
    pub fn distance_threshold(&self) -> f64 {
        self.distance_threshold
    }

    /// Whether the release speed alone is enough to decide the snap point.
    #[inline]
    #[must_use]
    pub fn is_flick(&self, velocity: f64) -> bool {
        velocity.abs() > self.velocity_threshold
    }

    /// Whether a release carries enough motion to change the snap point.
    #[must_use]
    pub fn is_significant(&self, release: &ReleaseState) -> bool {
        self.is_flick(release.velocity) || release.distance.abs() > self.distance_threshold
    }

    /// Resolve the rest position for `release`.
    #[must_use]
    pub fn resolve(&self, release: &ReleaseState, points: &SnapPoints) -> SnapPoint {
        if !self.is_significant(release) {
            return release.start;
        }

        if self.is_flick(release.velocity) {
            return if release.velocity > 0.0 {
                SnapPoint::Collapsed
            } else {
                SnapPoint::Expanded
            };
        }

        if release.height < points.midpoint() {
            SnapPoint::Collapsed
        } else {
            SnapPoint::Expanded
        }
    }
}
