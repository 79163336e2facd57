#![forbid(unsafe_code)]

//! Gesture sampling: turns raw pointer motion into timestamped samples.
//!
//! [`GestureSampler`] accepts [`PointerEvent`]s from the host and produces
//! immutable [`GestureSample`]s with a smoothed velocity. It owns nothing
//! about the panel; the controller converts samples into heights.
//!
//! # Velocity
//!
//! Velocity is the rate of change over the *latest* event interval, blended
//! with the previous estimate. The carried weight decays with the length of
//! the interval, measured in reference frames of 16 ms:
//!
//!   carry = (1 − α)^(Δt / 16 ms)
//!   v     = (1 − carry)·(Δposition / Δt) + carry·v_prev
//!
//! With the default α = 0.8 a direction reversal just before release shows up
//! in the final sample almost immediately, which an average over the whole
//! gesture would hide. A pause before release drives the carry toward zero,
//! so a flick followed by holding still reports almost no velocity.
//!
//! # Invariants
//!
//! 1. Sample timestamps within one gesture are strictly increasing.
//! 2. Every emitted sample has finite position, translation, and velocity.
//! 3. `was_significant_motion` is monotonic within a gesture: once the
//!    cumulative path length exceeds the dead zone it stays set.
//! 4. A rejected event never mutates sampler state.
//!
//! # Failure Modes
//!
//! - Out-of-order or duplicate timestamps and non-finite coordinates are
//!   rejected with a [`SampleRejection`]. The caller logs and drops them.
//! - An `end` whose own sample is malformed still ends the gesture, using the
//!   last accepted sample as the final one.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::DrawerConfig;

/// Interval at which the carried velocity weight equals `1 − smoothing`.
const REFERENCE_INTERVAL_SECS: f64 = 0.016;

/// Phase of a raw pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PointerPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// A raw pointer event along the panel's drag axis.
///
/// Positions grow downward, as in screen coordinates: a positive translation
/// shrinks the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointerEvent {
    pub phase: PointerPhase,
    /// Absolute pointer position (px).
    pub absolute_position: f64,
    /// Translation since the gesture started (px).
    pub translation: f64,
    /// Monotonic timestamp.
    pub timestamp: Duration,
}

impl PointerEvent {
    #[must_use]
    pub fn new(
        phase: PointerPhase,
        absolute_position: f64,
        translation: f64,
        timestamp: Duration,
    ) -> Self {
        Self {
            phase,
            absolute_position,
            translation,
            timestamp,
        }
    }

    #[must_use]
    pub fn start(absolute_position: f64, timestamp: Duration) -> Self {
        Self::new(PointerPhase::Start, absolute_position, 0.0, timestamp)
    }

    #[must_use]
    pub fn moved(absolute_position: f64, translation: f64, timestamp: Duration) -> Self {
        Self::new(PointerPhase::Move, absolute_position, translation, timestamp)
    }

    #[must_use]
    pub fn end(absolute_position: f64, translation: f64, timestamp: Duration) -> Self {
        Self::new(PointerPhase::End, absolute_position, translation, timestamp)
    }

    #[must_use]
    pub fn cancel(absolute_position: f64, translation: f64, timestamp: Duration) -> Self {
        Self::new(PointerPhase::Cancel, absolute_position, translation, timestamp)
    }

    fn is_finite(&self) -> bool {
        self.absolute_position.is_finite() && self.translation.is_finite()
    }
}

/// One accepted point of a gesture. Immutable once captured.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GestureSample {
    pub timestamp: Duration,
    pub absolute_position: f64,
    pub translation: f64,
    /// Smoothed velocity (px/s). Positive means moving down.
    pub velocity: f64,
}

/// Why an event was not turned into a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRejection {
    /// Position or translation was NaN or infinite.
    NonFiniteInput,
    /// Timestamp did not advance past the previous sample.
    NonIncreasingTimestamp,
    /// A move/end arrived with no gesture in progress.
    NoActiveGesture,
}

impl std::fmt::Display for SampleRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteInput => write!(f, "non-finite pointer coordinates"),
            Self::NonIncreasingTimestamp => write!(f, "timestamp did not increase"),
            Self::NoActiveGesture => write!(f, "no gesture in progress"),
        }
    }
}

impl std::error::Error for SampleRejection {}

/// Everything the resolver needs once a gesture is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSummary {
    pub first: GestureSample,
    pub last: GestureSample,
    pub was_significant_motion: bool,
    pub sample_count: usize,
}

impl GestureSummary {
    /// Absolute pointer distance between the first and final samples.
    #[must_use]
    pub fn distance(&self) -> f64 {
        (self.last.absolute_position - self.first.absolute_position).abs()
    }

    /// Velocity of the final sample.
    #[inline]
    #[must_use]
    pub fn final_velocity(&self) -> f64 {
        self.last.velocity
    }
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    first: GestureSample,
    last: GestureSample,
    path_length: f64,
    was_significant_motion: bool,
    sample_count: usize,
}

impl ActiveGesture {
    fn summary(&self) -> GestureSummary {
        GestureSummary {
            first: self.first,
            last: self.last,
            was_significant_motion: self.was_significant_motion,
            sample_count: self.sample_count,
        }
    }
}

/// Stateful sampler for one gesture at a time.
#[derive(Debug, Clone)]
pub struct GestureSampler {
    dead_zone: f64,
    smoothing: f64,
    active: Option<ActiveGesture>,
}

impl GestureSampler {
    /// Create a sampler. `smoothing` is the weight of the newest interval over
    /// one 16 ms reference frame and is clamped into (0, 1].
    #[must_use]
    pub fn new(dead_zone: f64, smoothing: f64) -> Self {
        Self {
            dead_zone: dead_zone.abs(),
            smoothing: smoothing.clamp(f64::EPSILON, 1.0),
            active: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &DrawerConfig) -> Self {
        Self::new(config.dead_zone, config.velocity_smoothing)
    }

    /// Whether a gesture is in progress.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The most recent accepted sample of the current gesture.
    #[must_use]
    pub fn last_sample(&self) -> Option<GestureSample> {
        self.active.as_ref().map(|g| g.last)
    }

    /// Whether the current gesture has left the dead zone.
    #[must_use]
    pub fn was_significant_motion(&self) -> bool {
        self.active.as_ref().is_some_and(|g| g.was_significant_motion)
    }

    /// Begin a gesture, discarding any gesture still in progress.
    pub fn begin(&mut self, event: &PointerEvent) -> Result<GestureSample, SampleRejection> {
        if !event.is_finite() {
            return Err(SampleRejection::NonFiniteInput);
        }
        let sample = GestureSample {
            timestamp: event.timestamp,
            absolute_position: event.absolute_position,
            translation: event.translation,
            velocity: 0.0,
        };
        self.active = Some(ActiveGesture {
            first: sample,
            last: sample,
            path_length: 0.0,
            was_significant_motion: false,
            sample_count: 1,
        });
        Ok(sample)
    }

    /// Record a move of the current gesture.
    pub fn sample(&mut self, event: &PointerEvent) -> Result<GestureSample, SampleRejection> {
        let smoothing = self.smoothing;
        let dead_zone = self.dead_zone;
        let gesture = self.active.as_mut().ok_or(SampleRejection::NoActiveGesture)?;
        if !event.is_finite() {
            return Err(SampleRejection::NonFiniteInput);
        }
        if event.timestamp <= gesture.last.timestamp {
            return Err(SampleRejection::NonIncreasingTimestamp);
        }

        let dt = (event.timestamp - gesture.last.timestamp).as_secs_f64();
        let delta = event.absolute_position - gesture.last.absolute_position;
        let instantaneous = delta / dt;
        let carry = (1.0 - smoothing).powf(dt / REFERENCE_INTERVAL_SECS);
        let velocity = (1.0 - carry) * instantaneous + carry * gesture.last.velocity;
        if !velocity.is_finite() {
            return Err(SampleRejection::NonFiniteInput);
        }

        let sample = GestureSample {
            timestamp: event.timestamp,
            absolute_position: event.absolute_position,
            translation: event.translation,
            velocity,
        };

        gesture.path_length += (event.translation - gesture.last.translation).abs();
        if gesture.path_length > dead_zone {
            gesture.was_significant_motion = true;
        }
        gesture.last = sample;
        gesture.sample_count += 1;
        Ok(sample)
    }

    /// End the current gesture. The end event is sampled if it is well
    /// formed; otherwise the last accepted sample is final.
    pub fn end(&mut self, event: &PointerEvent) -> Result<GestureSummary, SampleRejection> {
        if self.active.is_none() {
            return Err(SampleRejection::NoActiveGesture);
        }
        if let Err(rejection) = self.sample(event) {
            tracing::debug!(%rejection, "end sample discarded, using last accepted sample");
        }
        self.active
            .take()
            .map(|g| g.summary())
            .ok_or(SampleRejection::NoActiveGesture)
    }

    /// Abandon the current gesture, returning what was captured.
    pub fn cancel(&mut self) -> Option<GestureSummary> {
        self.active.take().map(|g| g.summary())
    }
}
