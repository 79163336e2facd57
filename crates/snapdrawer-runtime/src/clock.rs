//! Frame clocks that feed [`crate::PanelController::tick`].
//!
//! A [`TickSource`] answers one question per frame: how much time passed
//! since the last frame. Hosts with a display link use [`WallClock`]; tests
//! and replays use [`FixedStep`] so every run is bit-for-bit repeatable.

use std::time::Duration;

use web_time::Instant;

/// Default ceiling on a single wall-clock frame delta.
///
/// A suspended process can resume with seconds of backlog; feeding that to
/// the spring in one go would jump the panel to its target.
pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// Produces the elapsed time for each frame.
pub trait TickSource {
    /// Time since the previous call. The first call reports the source's
    /// nominal frame length or zero.
    fn next_delta(&mut self) -> Duration;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Deterministic source: every frame is `step` long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStep {
    step: Duration,
}

impl FixedStep {
    /// A zero step is bumped to 1 ms so settles still make progress.
    #[must_use]
    pub fn new(step: Duration) -> Self {
        Self {
            step: if step.is_zero() {
                Duration::from_millis(1)
            } else {
                step
            },
        }
    }

    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    #[must_use]
    pub fn step(&self) -> Duration {
        self.step
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::from_millis(16)
    }
}

impl TickSource for FixedStep {
    fn next_delta(&mut self) -> Duration {
        self.step
    }

    fn name(&self) -> &str {
        "FixedStep"
    }
}

/// Monotonic wall clock with a per-frame ceiling.
#[derive(Debug, Clone)]
pub struct WallClock {
    last: Option<Instant>,
    max_delta: Duration,
}

impl WallClock {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_delta(DEFAULT_MAX_FRAME_DELTA)
    }

    #[must_use]
    pub fn with_max_delta(max_delta: Duration) -> Self {
        Self {
            last: None,
            max_delta,
        }
    }

    /// Forget the previous frame, e.g. after the host was hidden.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for WallClock {
    fn next_delta(&mut self) -> Duration {
        let now = Instant::now();
        let delta = match self.last {
            Some(prev) => now.saturating_duration_since(prev),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        if delta > self.max_delta {
            tracing::debug!(
                delta_ms = delta.as_millis() as u64,
                max_ms = self.max_delta.as_millis() as u64,
                "frame delta clamped"
            );
            self.max_delta
        } else {
            delta
        }
    }

    fn name(&self) -> &str {
        "WallClock"
    }
}
