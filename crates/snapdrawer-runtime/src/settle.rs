#![forbid(unsafe_code)]

//! Settle animator: drives the panel height onto a snap point with a spring.
//!
//! [`SpringAnimator`] owns at most one in-flight settle ("flight"). Starting
//! a new settle while one is running interrupts it: the running spring's
//! live position and velocity become the initial conditions of the new one,
//! so an interrupted panel never snaps back to a stale start value.
//!
//! # Completion
//!
//! A flight completes once its spring has been at rest for `settle_hold`,
//! or once it has run for `max_settle` (the spring is then placed on its
//! target). Either way [`SettleStep::Completed`] is returned exactly once
//! for that flight, and the flight is gone. Cancelled flights never complete.
//!
//! # Invariants
//!
//! 1. At most one flight exists; handles are never reused.
//! 2. After `cancel()` returns, no tick reports anything for the cancelled
//!    handle.
//! 3. Every flight terminates within `max_settle` of simulated time.
//!
//! # Failure Modes
//!
//! - A spring that diverges to a non-finite position ends its flight with
//!   [`SettleStep::Diverged`]; the controller treats this as a fault.

use std::time::Duration;

use snapdrawer_core::SnapPoint;
use snapdrawer_core::animation::{Animation, Spring};
use snapdrawer_core::config::SpringConfig;

/// Identity of one settle. Stale handles are simply ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettleHandle(u64);

impl SettleHandle {
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Initial conditions for a settle that does not interrupt another one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    pub height: f64,
    /// Height velocity (px/s). Positive means growing.
    pub velocity: f64,
}

impl Origin {
    #[must_use]
    pub fn at_rest(height: f64) -> Self {
        Self {
            height,
            velocity: 0.0,
        }
    }
}

/// Live state of a flight that was cancelled mid-way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interrupted {
    pub handle: SettleHandle,
    pub height: f64,
    pub velocity: f64,
}

/// Result of advancing the animator by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettleStep {
    /// Nothing in flight.
    Idle,
    /// Still moving.
    Running { height: f64, velocity: f64 },
    /// Arrived. Reported once per flight.
    Completed {
        handle: SettleHandle,
        target: SnapPoint,
        height: f64,
    },
    /// Integration blew up; the flight was dropped.
    Diverged { handle: SettleHandle },
}

#[derive(Debug, Clone)]
struct Flight {
    handle: SettleHandle,
    target: SnapPoint,
    spring: Spring,
    elapsed: Duration,
    rested_for: Duration,
}

/// Spring-driven settle with interruption support.
#[derive(Debug, Clone)]
pub struct SpringAnimator {
    config: SpringConfig,
    next_id: u64,
    flight: Option<Flight>,
}

impl SpringAnimator {
    #[must_use]
    pub fn new(config: SpringConfig) -> Self {
        Self {
            config,
            next_id: 1,
            flight: None,
        }
    }

    /// Whether a settle is in flight.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flight.is_some()
    }

    /// Handle of the settle in flight.
    #[must_use]
    pub fn active_handle(&self) -> Option<SettleHandle> {
        self.flight.as_ref().map(|f| f.handle)
    }

    /// Target of the settle in flight.
    #[must_use]
    pub fn target(&self) -> Option<SnapPoint> {
        self.flight.as_ref().map(|f| f.target)
    }

    /// Current `(height, velocity)` of the settle in flight.
    #[must_use]
    pub fn current(&self) -> Option<(f64, f64)> {
        self.flight
            .as_ref()
            .map(|f| (f.spring.position(), f.spring.velocity()))
    }

    /// Start settling toward `target` at `target_height`.
    ///
    /// If a settle is already in flight it is cancelled and its live state is
    /// used instead of `origin`.
    pub fn animate_to(
        &mut self,
        target: SnapPoint,
        target_height: f64,
        origin: Origin,
    ) -> SettleHandle {
        let (height, velocity) = match self.cancel() {
            Some(interrupted) => {
                tracing::debug!(
                    interrupted = interrupted.handle.id(),
                    height = interrupted.height,
                    velocity = interrupted.velocity,
                    "settle interrupted by new target"
                );
                (interrupted.height, interrupted.velocity)
            }
            None => (origin.height, origin.velocity),
        };

        let handle = SettleHandle(self.next_id);
        self.next_id += 1;

        let mut spring = Spring::from_config(&self.config, height, target_height);
        spring.retarget_from(height, velocity, target_height);
        self.flight = Some(Flight {
            handle,
            target,
            spring,
            elapsed: Duration::ZERO,
            rested_for: Duration::ZERO,
        });
        handle
    }

    /// Move the in-flight target height (e.g. after a viewport change)
    /// without disturbing position or velocity.
    pub fn retarget_height(&mut self, target_height: f64) {
        if let Some(flight) = self.flight.as_mut() {
            flight.spring.set_target(target_height);
            flight.rested_for = Duration::ZERO;
        }
    }

    /// Cancel the flight synchronously, returning its live state.
    pub fn cancel(&mut self) -> Option<Interrupted> {
        self.flight.take().map(|f| Interrupted {
            handle: f.handle,
            height: f.spring.position(),
            velocity: f.spring.velocity(),
        })
    }

    /// Advance the flight by `dt`.
    pub fn tick(&mut self, dt: Duration) -> SettleStep {
        let hold = self.config.settle_hold();
        let budget = self.config.max_settle();
        let Some(flight) = self.flight.as_mut() else {
            return SettleStep::Idle;
        };

        flight.spring.tick(dt);
        flight.elapsed = flight.elapsed.saturating_add(dt);

        let height = flight.spring.position();
        let velocity = flight.spring.velocity();
        if !height.is_finite() || !velocity.is_finite() {
            let handle = flight.handle;
            self.flight = None;
            return SettleStep::Diverged { handle };
        }

        if flight.spring.is_complete() {
            flight.rested_for = flight.rested_for.saturating_add(dt);
        } else {
            flight.rested_for = Duration::ZERO;
        }

        let arrived = flight.spring.is_complete() && flight.rested_for >= hold;
        let exhausted = flight.elapsed >= budget;
        if !(arrived || exhausted) {
            return SettleStep::Running { height, velocity };
        }

        if exhausted && !arrived {
            tracing::debug!(
                handle = flight.handle.id(),
                elapsed_ms = flight.elapsed.as_millis() as u64,
                "settle budget exhausted, placing on target"
            );
            flight.spring.settle();
        }

        let done = SettleStep::Completed {
            handle: flight.handle,
            target: flight.target,
            height: flight.spring.position(),
        };
        self.flight = None;
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_16: Duration = Duration::from_millis(16);

    fn animator() -> SpringAnimator {
        SpringAnimator::new(SpringConfig::default())
    }

    fn run_to_completion(a: &mut SpringAnimator, max_frames: usize) -> (usize, Option<SettleStep>) {
        for frame in 0..max_frames {
            let step = a.tick(MS_16);
            if matches!(step, SettleStep::Completed { .. }) {
                return (frame + 1, Some(step));
            }
        }
        (max_frames, None)
    }

    #[test]
    fn idle_animator_reports_idle() {
        assert_eq!(animator().tick(MS_16), SettleStep::Idle);
    }

    #[test]
    fn settles_on_target_and_completes_once() {
        let mut a = animator();
        let handle = a.animate_to(SnapPoint::Expanded, 600.0, Origin::at_rest(100.0));
        let (_, step) = run_to_completion(&mut a, 400);
        assert_eq!(
            step,
            Some(SettleStep::Completed {
                handle,
                target: SnapPoint::Expanded,
                height: 600.0
            })
        );
        assert!(!a.is_running());
        assert_eq!(a.tick(MS_16), SettleStep::Idle);
    }

    #[test]
    fn interruption_carries_live_state() {
        let mut a = animator();
        let first = a.animate_to(SnapPoint::Expanded, 600.0, Origin::at_rest(100.0));
        for _ in 0..10 {
            a.tick(MS_16);
        }
        let (h, v) = a.current().expect("running");
        assert!(v > 0.0);

        // The origin is ignored while a flight is live.
        let second = a.animate_to(SnapPoint::Collapsed, 100.0, Origin::at_rest(999.0));
        assert_ne!(first, second);
        assert_eq!(a.current(), Some((h, v)));
        assert_eq!(a.active_handle(), Some(second));
    }

    #[test]
    fn cancelled_flight_never_completes() {
        let mut a = animator();
        a.animate_to(SnapPoint::Expanded, 600.0, Origin::at_rest(100.0));
        a.tick(MS_16);
        let interrupted = a.cancel().expect("was running");
        assert!(interrupted.height > 100.0 && interrupted.height < 600.0);
        for _ in 0..400 {
            assert_eq!(a.tick(MS_16), SettleStep::Idle);
        }
    }

    #[test]
    fn already_at_target_completes_on_first_tick() {
        let mut a = animator();
        a.animate_to(SnapPoint::Collapsed, 100.0, Origin::at_rest(100.0));
        let (frames, step) = run_to_completion(&mut a, 5);
        assert_eq!(frames, 1);
        assert!(step.is_some());
    }

    #[test]
    fn default_hold_spans_one_frame_at_high_refresh() {
        let mut a = animator();
        a.animate_to(SnapPoint::Collapsed, 100.0, Origin::at_rest(100.0));
        let half_frame = Duration::from_millis(8);
        assert!(matches!(a.tick(half_frame), SettleStep::Running { .. }));
        assert!(matches!(a.tick(half_frame), SettleStep::Completed { .. }));
        assert_eq!(a.tick(half_frame), SettleStep::Idle);
    }

    #[test]
    fn settle_hold_delays_completion() {
        let config = SpringConfig {
            settle_hold_ms: 48,
            ..SpringConfig::default()
        };
        let mut a = SpringAnimator::new(config);
        a.animate_to(SnapPoint::Collapsed, 100.0, Origin::at_rest(100.0));
        assert!(matches!(a.tick(MS_16), SettleStep::Running { .. }));
        assert!(matches!(a.tick(MS_16), SettleStep::Running { .. }));
        assert!(matches!(a.tick(MS_16), SettleStep::Completed { .. }));
    }

    #[test]
    fn budget_forces_termination() {
        let config = SpringConfig {
            damping: 0.0,
            max_settle_ms: 500,
            ..SpringConfig::default()
        };
        let mut a = SpringAnimator::new(config);
        a.animate_to(SnapPoint::Expanded, 600.0, Origin::at_rest(100.0));
        let (frames, step) = run_to_completion(&mut a, 100);
        assert!(frames <= 32, "took {frames} frames");
        assert!(matches!(
            step,
            Some(SettleStep::Completed { height, .. }) if height == 600.0
        ));
    }

    #[test]
    fn retarget_keeps_handle_and_motion() {
        let mut a = animator();
        let handle = a.animate_to(SnapPoint::Expanded, 600.0, Origin::at_rest(100.0));
        a.tick(MS_16);
        let before = a.current();
        a.retarget_height(500.0);
        assert_eq!(a.current(), before);
        assert_eq!(a.active_handle(), Some(handle));
        let (_, step) = run_to_completion(&mut a, 400);
        assert!(matches!(step, Some(SettleStep::Completed { height, .. }) if height == 500.0));
    }

    #[test]
    fn divergence_is_reported() {
        let config = SpringConfig {
            stiffness: 1.0e12,
            mass: 0.001,
            damping: 0.0,
            ..SpringConfig::default()
        };
        let mut a = SpringAnimator::new(config);
        let handle = a.animate_to(SnapPoint::Expanded, 600.0, Origin::at_rest(100.0));
        let mut diverged = false;
        for _ in 0..50 {
            if a.tick(MS_16) == (SettleStep::Diverged { handle }) {
                diverged = true;
                break;
            }
        }
        assert!(diverged);
        assert!(!a.is_running());
    }
}
