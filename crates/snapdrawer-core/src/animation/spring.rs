#![forbid(unsafe_code)]

//! Damped harmonic oscillator (spring) in panel units.
//!
//! Drives the panel height toward a snap point with physically plausible
//! motion. Based on the classical damped spring equation with mass:
//!
//!   m·a = -stiffness × (position - target) - damping × velocity
//!
//! # Parameters
//!
//! - **stiffness** (k): Restoring force strength. Higher = faster response.
//! - **damping** (c): Velocity drag. Higher = less oscillation.
//!   - Underdamped (c < 2√(k·m)): oscillates past target before settling
//!   - Critically damped (c = 2√(k·m)): fastest convergence without overshoot
//!   - Overdamped (c > 2√(k·m)): slower convergence, no overshoot
//! - **mass** (m): Inertia. Higher = slower, heavier response.
//! - **rest_displacement** / **rest_velocity**: the spring is at rest once
//!   both `|position - target|` and `|velocity|` drop below these.
//!
//! # Integration
//!
//! Semi-implicit Euler. `advance()` subdivides its `Duration` into steps of
//! at most 4ms so that stiff springs stay stable at low frame rates.
//!
//! # Invariants
//!
//! 1. A spring at rest does not move until `set_target()` or
//!    `retarget_from()` is called.
//! 2. Coming to rest snaps `position` exactly onto `target` and zeroes velocity.
//! 3. Stiffness and mass are always positive, damping is never negative
//!    (clamped on construction).
//! 4. `retarget_from()` never discards the caller's position or velocity: an
//!    interrupted spring continues from where it actually was.
//!
//! # Failure Modes
//!
//! - Extreme stiffness/mass ratios can still diverge; callers must check
//!   `position().is_finite()` after ticking.
//! - Zero damping oscillates forever and never reports rest.

use std::time::Duration;

use super::Animation;
use crate::config::SpringConfig;

/// Maximum dt per integration step (4ms).
const MAX_STEP_SECS: f64 = 0.004;

/// Minimum stiffness and mass to prevent degenerate springs.
const MIN_STIFFNESS: f64 = 0.1;
const MIN_MASS: f64 = 0.001;

/// A damped harmonic oscillator producing physically based motion.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use snapdrawer_core::animation::{Animation, Spring};
///
/// let mut spring = Spring::new(100.0, 600.0)
///     .with_stiffness(400.0)
///     .with_damping(50.0)
///     .with_mass(0.8);
///
/// for _ in 0..180 {
///     spring.tick(Duration::from_millis(16));
/// }
///
/// assert!(spring.is_complete());
/// assert_eq!(spring.position(), 600.0);
/// ```
#[derive(Debug, Clone)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    stiffness: f64,
    damping: f64,
    mass: f64,
    rest_displacement: f64,
    rest_velocity: f64,
    at_rest: bool,
}

impl Spring {
    /// Create a spring starting at `initial` and targeting `target`, using
    /// the drawer's default constants.
    #[must_use]
    pub fn new(initial: f64, target: f64) -> Self {
        Self::from_config(&SpringConfig::default(), initial, target)
    }

    /// Create a spring from validated configuration.
    #[must_use]
    pub fn from_config(config: &SpringConfig, initial: f64, target: f64) -> Self {
        Self {
            position: initial,
            velocity: 0.0,
            target,
            stiffness: config.stiffness.max(MIN_STIFFNESS),
            damping: config.damping.max(0.0),
            mass: config.mass.max(MIN_MASS),
            rest_displacement: config.rest_displacement.abs(),
            rest_velocity: config.rest_velocity.abs(),
            at_rest: false,
        }
    }

    /// Set stiffness (builder pattern). Clamped to minimum 0.1.
    #[must_use]
    pub fn with_stiffness(mut self, k: f64) -> Self {
        self.stiffness = k.max(MIN_STIFFNESS);
        self
    }

    /// Set damping (builder pattern). Clamped to minimum 0.0.
    #[must_use]
    pub fn with_damping(mut self, c: f64) -> Self {
        self.damping = c.max(0.0);
        self
    }

    /// Set mass (builder pattern). Clamped to a small positive minimum.
    #[must_use]
    pub fn with_mass(mut self, m: f64) -> Self {
        self.mass = m.max(MIN_MASS);
        self
    }

    /// Set the initial velocity (builder pattern).
    #[must_use]
    pub fn with_velocity(mut self, v: f64) -> Self {
        self.velocity = v;
        self
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    #[inline]
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    #[inline]
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Change the target. Wakes the spring if it was at rest.
    pub fn set_target(&mut self, target: f64) {
        if (self.target - target).abs() > self.rest_displacement {
            self.target = target;
            self.at_rest = false;
        }
    }

    /// Restart toward `target` from an explicit position and velocity.
    ///
    /// Used when an interrupted motion hands its live state to a new spring.
    pub fn retarget_from(&mut self, position: f64, velocity: f64, target: f64) {
        self.position = position;
        self.velocity = velocity;
        self.target = target;
        self.at_rest = false;
    }

    /// Whether the spring has settled at the target.
    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Whether position and velocity are inside the rest thresholds right now.
    #[must_use]
    pub fn within_rest_thresholds(&self) -> bool {
        (self.position - self.target).abs() < self.rest_displacement
            && self.velocity.abs() < self.rest_velocity
    }

    /// Damping coefficient at which this spring is critically damped.
    #[must_use]
    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    /// Force the spring onto its target at rest.
    pub fn settle(&mut self) {
        self.position = self.target;
        self.velocity = 0.0;
        self.at_rest = true;
    }

    /// Perform a single integration step of `dt` seconds.
    fn step(&mut self, dt: f64) {
        let displacement = self.position - self.target;
        let spring_force = -self.stiffness * displacement;
        let damping_force = -self.damping * self.velocity;
        let acceleration = (spring_force + damping_force) / self.mass;

        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Advance the spring by `dt`, subdividing if necessary for stability.
    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }

        let total_secs = dt.as_secs_f64();
        if total_secs <= 0.0 {
            return;
        }

        let mut remaining = total_secs;
        while remaining > 0.0 {
            let step_dt = remaining.min(MAX_STEP_SECS);
            self.step(step_dt);
            remaining -= step_dt;
        }

        if self.within_rest_thresholds() {
            self.settle();
        }
    }
}

impl Animation for Spring {
    fn tick(&mut self, dt: Duration) {
        self.advance(dt);
    }

    fn is_complete(&self) -> bool {
        self.at_rest
    }
}

/// Common spring configurations.
pub mod presets {
    use super::Spring;
    use crate::config::SpringConfig;

    /// The drawer's settle spring: damping 50, stiffness 400, mass 0.8.
    #[must_use]
    pub fn drawer(initial: f64, target: f64) -> Spring {
        Spring::from_config(&SpringConfig::default(), initial, target)
    }

    /// Critically damped spring for the given stiffness and mass.
    #[must_use]
    pub fn critical(initial: f64, target: f64, stiffness: f64, mass: f64) -> Spring {
        let c = 2.0 * (stiffness * mass).sqrt();
        Spring::new(initial, target)
            .with_stiffness(stiffness)
            .with_mass(mass)
            .with_damping(c)
    }
}
