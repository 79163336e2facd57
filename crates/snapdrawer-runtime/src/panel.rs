#![forbid(unsafe_code)]

//! The panel controller: sole owner and writer of panel state.
//!
//! [`PanelController`] combines the gesture sampler, boundary resistance,
//! snap resolver, and settle animator under one phase gate. Exactly one
//! driver owns the height at a time, and the type makes that structural:
//!
//! ```text
//!            pointer start                 pointer end / cancel
//!   Idle ────────────────────▶ Dragging ─────────────────────────▶ Settling
//!    ▲  ╲                        ▲                                  │  │
//!    │   ╲ expand/collapse       └───────── pointer start ──────────┘  │
//!    │    ╲────────────────────────────────────────────▶ Settling      │
//!    └──────────────────────────── settle completed ───────────────────┘
//! ```
//!
//! # Outbound
//!
//! - [`PanelController::subscribe`]: same-thread callbacks with every new
//!   [`PanelSnapshot`] (height, phase, targets, presentation signals).
//! - [`PanelController::reader`]: a `Send + Sync` handle for a render thread.
//! - [`PanelController::drain_events`]: discrete [`PanelEvent`]s in the order
//!   they happened.
//!
//! Snapshots are published only after a transition has fully applied, so a
//! subscriber never observes a half-updated state.
//!
//! # Invariants
//!
//! 1. Phase transitions are `Idle → Dragging → Settling → Idle`, with
//!    `Settling → Dragging` on interruption and `Idle/Settling → Settling`
//!    for commands. `recover()` is the only other path to `Idle`.
//! 2. Interrupting a settle never moves the height.
//! 3. A cancelled settle can never complete or write the height.
//! 4. Malformed pointer input never changes state.
//!
//! # Failure Modes
//!
//! - A non-finite height (diverging spring) triggers [`PanelController::recover`]:
//!   the panel is put at rest on its last settled snap point.

use std::sync::Arc;
use std::time::Duration;

use snapdrawer_core::{
    ConfigError, DrawerConfig, GestureSampler, Phase, PointerEvent, PointerPhase,
    PresentationSignals, ReleaseState, ResistanceCurve, SampleRejection, SnapPoint, SnapPoints,
    SnapResolver,
};

use crate::clock::TickSource;
use crate::event::{PanelEvent, PanelSnapshot, PanelState};
use crate::feed::{SnapshotFeed, Subscription};
use crate::settle::{Origin, SettleHandle, SettleStep, SpringAnimator};
use crate::snapshot_store::{SnapshotReader, SnapshotStore};

/// Explicit host commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Expand,
    Collapse,
    /// Go to the opposite of the current target.
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSession {
    start_height: f64,
    start_snap: SnapPoint,
}

/// Who drives the height. Carries exactly the state that driver needs.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Driver {
    Idle,
    Dragging(DragSession),
    Settling(SettleHandle),
}

impl Driver {
    fn phase(self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Dragging(_) => Phase::Dragging,
            Self::Settling(_) => Phase::Settling,
        }
    }
}

/// Interaction controller for one mounted panel.
#[derive(Debug)]
pub struct PanelController {
    config: DrawerConfig,
    points: SnapPoints,
    resolver: SnapResolver,
    curve: ResistanceCurve,
    sampler: GestureSampler,
    animator: SpringAnimator,
    driver: Driver,
    height: f64,
    target: SnapPoint,
    last_settled: SnapPoint,
    events: Vec<PanelEvent>,
    snapshots: SnapshotFeed,
    store: Arc<SnapshotStore>,
}

impl PanelController {
    /// Build a controller at rest on the collapsed snap point.
    ///
    /// Fails if the configuration is invalid; nothing downstream works
    /// without strictly ordered snap points.
    pub fn new(config: DrawerConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let points = config.snap_points()?;
        let height = points.collapsed();
        let state = PanelState {
            phase: Phase::Idle,
            height,
            target_snap: SnapPoint::Collapsed,
            last_settled: SnapPoint::Collapsed,
        };
        let initial = snapshot_of(state, &points, &config);

        tracing::debug!(
            collapsed = points.collapsed(),
            expanded = points.expanded(),
            "panel controller created"
        );

        Ok(Self {
            resolver: SnapResolver::from_config(&config),
            curve: ResistanceCurve::new(config.resistance_low, config.resistance_high),
            sampler: GestureSampler::from_config(&config),
            animator: SpringAnimator::new(config.spring.clone()),
            driver: Driver::Idle,
            height,
            target: SnapPoint::Collapsed,
            last_settled: SnapPoint::Collapsed,
            events: Vec::new(),
            snapshots: SnapshotFeed::new(initial),
            store: Arc::new(SnapshotStore::new(initial)),
            points,
            config,
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &DrawerConfig {
        &self.config
    }

    #[must_use]
    pub fn snap_points(&self) -> SnapPoints {
        self.points
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.driver.phase()
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn state(&self) -> PanelState {
        PanelState {
            phase: self.phase(),
            height: self.height,
            target_snap: self.target,
            last_settled: self.last_settled,
        }
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> PanelSnapshot {
        *self.snapshots.current()
    }

    #[must_use]
    pub fn signals(&self) -> PresentationSignals {
        self.snapshots.current().signals
    }

    /// Number of snapshots published after the initial one.
    #[must_use]
    pub fn snapshot_version(&self) -> u64 {
        self.snapshots.version()
    }

    // ── Outbound ──────────────────────────────────────────────────────────

    /// Call `callback` with every new snapshot until the guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&PanelSnapshot) + 'static) -> Subscription {
        self.snapshots.subscribe(callback)
    }

    /// Read handle for another thread.
    #[must_use]
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader::new(Arc::clone(&self.store))
    }

    /// Take all queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<PanelEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Inbound: pointer ──────────────────────────────────────────────────

    /// Feed one raw pointer event.
    ///
    /// A rejected event has already been logged and ignored; the error is
    /// returned for hosts that want to count them.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<(), SampleRejection> {
        let result = match event.phase {
            PointerPhase::Start => self.pointer_start(&event),
            PointerPhase::Move => self.pointer_move(&event),
            PointerPhase::End => self.pointer_end(&event),
            PointerPhase::Cancel => self.pointer_cancel(),
        };
        if let Err(rejection) = result {
            tracing::debug!(
                phase = ?event.phase,
                position = event.absolute_position,
                translation = event.translation,
                %rejection,
                "pointer event ignored"
            );
        }
        result
    }

    fn pointer_start(&mut self, event: &PointerEvent) -> Result<(), SampleRejection> {
        // Validate before touching the animator so a bad start changes nothing.
        self.sampler.begin(event)?;

        let start_snap = match self.driver {
            Driver::Idle => self.target,
            Driver::Settling(_) => {
                if let Some(interrupted) = self.animator.cancel() {
                    // The animator's live value is ground truth.
                    self.height = interrupted.height;
                    tracing::debug!(
                        height = interrupted.height,
                        velocity = interrupted.velocity,
                        "settle interrupted by gesture"
                    );
                }
                self.target
            }
            Driver::Dragging(session) => {
                tracing::debug!("gesture restarted while dragging");
                session.start_snap
            }
        };

        self.enter(Driver::Dragging(DragSession {
            start_height: self.height,
            start_snap,
        }));
        self.publish();
        Ok(())
    }

    fn pointer_move(&mut self, event: &PointerEvent) -> Result<(), SampleRejection> {
        let Driver::Dragging(session) = self.driver else {
            return Err(SampleRejection::NoActiveGesture);
        };
        let sample = self.sampler.sample(event)?;
        self.follow_pointer(session, sample.translation);
        self.publish();
        Ok(())
    }

    fn pointer_end(&mut self, event: &PointerEvent) -> Result<(), SampleRejection> {
        let Driver::Dragging(session) = self.driver else {
            return Err(SampleRejection::NoActiveGesture);
        };
        let summary = self.sampler.end(event)?;
        self.follow_pointer(session, summary.last.translation);

        let release = ReleaseState {
            height: self.height,
            velocity: summary.final_velocity(),
            distance: summary.distance(),
            start: session.start_snap,
        };
        let target = self.resolver.resolve(&release, &self.points);
        tracing::debug!(
            start = %session.start_snap,
            %target,
            height = release.height,
            velocity = release.velocity,
            distance = release.distance,
            significant = summary.was_significant_motion,
            "gesture resolved"
        );
        self.events.push(PanelEvent::GestureResolved {
            start: session.start_snap,
            target,
            velocity: release.velocity,
            distance: release.distance,
            was_significant_motion: summary.was_significant_motion,
        });

        // Pointer velocity is positive downward; height grows upward.
        let velocity = -release.velocity * self.config.release_velocity_scale;
        self.settle_to(target, Origin {
            height: self.height,
            velocity,
        });
        Ok(())
    }

    fn pointer_cancel(&mut self) -> Result<(), SampleRejection> {
        let Driver::Dragging(session) = self.driver else {
            return Err(SampleRejection::NoActiveGesture);
        };
        self.sampler.cancel();
        tracing::debug!(start = %session.start_snap, "gesture cancelled");
        self.settle_to(session.start_snap, Origin::at_rest(self.height));
        Ok(())
    }

    /// Height follows the pointer through boundary resistance; the live
    /// target tracks which side of the collapsed band the height is on.
    fn follow_pointer(&mut self, session: DragSession, translation: f64) {
        let proposed = session.start_height - translation;
        self.height = self
            .curve
            .apply(proposed, self.points.collapsed(), self.points.expanded());
        self.target = if self.height <= self.points.collapsed() + self.config.live_target_band {
            SnapPoint::Collapsed
        } else {
            SnapPoint::Expanded
        };
    }

    // ── Inbound: commands ─────────────────────────────────────────────────

    /// Apply a command. Returns `false` if it was ignored (while dragging).
    pub fn command(&mut self, command: PanelCommand) -> bool {
        if matches!(self.driver, Driver::Dragging(_)) {
            tracing::debug!(?command, "command ignored while dragging");
            return false;
        }
        let target = match command {
            PanelCommand::Expand => SnapPoint::Expanded,
            PanelCommand::Collapse => SnapPoint::Collapsed,
            PanelCommand::Toggle => self.target.opposite(),
        };
        self.settle_to(target, Origin::at_rest(self.height));
        true
    }

    pub fn expand(&mut self) -> bool {
        self.command(PanelCommand::Expand)
    }

    pub fn collapse(&mut self) -> bool {
        self.command(PanelCommand::Collapse)
    }

    pub fn toggle(&mut self) -> bool {
        self.command(PanelCommand::Toggle)
    }

    fn settle_to(&mut self, target: SnapPoint, origin: Origin) {
        self.target = target;
        let handle = self
            .animator
            .animate_to(target, self.points.height_of(target), origin);
        self.enter(Driver::Settling(handle));
        self.publish();
    }

    // ── Frames ────────────────────────────────────────────────────────────

    /// Advance the settle animation by `dt`. No-op unless settling.
    pub fn tick(&mut self, dt: Duration) {
        let Driver::Settling(handle) = self.driver else {
            return;
        };
        match self.animator.tick(dt) {
            SettleStep::Running { height, .. } => {
                self.height = height;
                self.publish();
            }
            SettleStep::Completed {
                handle: done,
                target,
                height,
            } if done == handle => {
                self.height = height;
                self.target = target;
                self.last_settled = target;
                self.events.push(PanelEvent::SnapPointReached {
                    point: target,
                    height,
                });
                tracing::info!(point = %target, height, "snap point reached");
                self.enter(Driver::Idle);
                self.publish();
            }
            SettleStep::Diverged { handle: bad } => {
                tracing::error!(handle = bad.id(), "settle diverged");
                self.recover();
            }
            other => {
                tracing::error!(?other, expected = handle.id(), "animator out of step with panel");
                self.recover();
            }
        }
    }

    /// Advance by whatever `source` reports for this frame.
    pub fn tick_from(&mut self, source: &mut impl TickSource) {
        let dt = source.next_delta();
        self.tick(dt);
    }

    // ── Environment ───────────────────────────────────────────────────────

    /// Recompute snap points for a new viewport height.
    ///
    /// Invalid viewports are rejected and the current snap points kept.
    /// At rest the panel moves to the new height of its snap point; a settle
    /// in flight is retargeted; a drag continues against the new bounds.
    pub fn set_viewport_height(&mut self, viewport_height: f64) -> Result<(), ConfigError> {
        let points = match SnapPoints::for_viewport(
            self.config.collapsed_height,
            self.config.expanded,
            viewport_height,
        ) {
            Ok(points) => points,
            Err(err) => {
                tracing::warn!(viewport_height, %err, "viewport resize rejected");
                return Err(err);
            }
        };
        self.config.viewport_height = viewport_height;
        if points == self.points {
            return Ok(());
        }
        self.points = points;
        tracing::debug!(
            viewport_height,
            collapsed = points.collapsed(),
            expanded = points.expanded(),
            "snap points recomputed"
        );

        match self.driver {
            Driver::Idle => self.height = points.height_of(self.last_settled),
            Driver::Settling(_) => self.animator.retarget_height(points.height_of(self.target)),
            Driver::Dragging(session) => {
                if let Some(last) = self.sampler.last_sample() {
                    self.follow_pointer(session, last.translation);
                }
            }
        }
        self.publish();
        Ok(())
    }

    /// Fault fallback: drop every driver and rest on the last settled point.
    pub fn recover(&mut self) {
        self.animator.cancel();
        self.sampler.cancel();
        let point = self.last_settled;
        self.height = self.points.height_of(point);
        self.target = point;
        tracing::error!(point = %point, height = self.height, "panel recovered to rest");
        self.events.push(PanelEvent::Recovered { point });
        self.enter(Driver::Idle);
        self.publish();
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn enter(&mut self, next: Driver) {
        let from = self.driver.phase();
        self.driver = next;
        let to = next.phase();
        if from != to {
            tracing::debug!(%from, %to, "phase changed");
            self.events.push(PanelEvent::PhaseChanged { from, to });
        }
    }

    fn publish(&mut self) {
        if !self.height.is_finite() {
            // Only reachable through a bug upstream; never publish it.
            tracing::error!(height = self.height, "non-finite height");
            self.recover();
            return;
        }
        let snapshot = snapshot_of(self.state(), &self.points, &self.config);
        if self.snapshots.publish(snapshot) {
            self.store.publish(snapshot);
        }
    }
}

fn snapshot_of(state: PanelState, points: &SnapPoints, config: &DrawerConfig) -> PanelSnapshot {
    PanelSnapshot {
        state,
        collapsed_height: points.collapsed(),
        expanded_height: points.expanded(),
        signals: PresentationSignals::derive(
            state.height,
            state.phase,
            points,
            &config.presentation,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn controller() -> PanelController {
        PanelController::new(DrawerConfig::fixed(100.0, 600.0)).expect("valid config")
    }

    fn settle(c: &mut PanelController) {
        for _ in 0..500 {
            if c.phase() == Phase::Idle {
                return;
            }
            c.tick(FRAME);
        }
        panic!("panel did not settle");
    }

    #[test]
    fn starts_idle_collapsed() {
        let c = controller();
        let state = c.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.height, 100.0);
        assert_eq!(state.target_snap, SnapPoint::Collapsed);
        assert_eq!(state.last_settled, SnapPoint::Collapsed);
        assert_eq!(c.snapshot().height(), 100.0);
    }

    #[test]
    fn rejects_inverted_snap_points() {
        let err = PanelController::new(DrawerConfig::fixed(600.0, 100.0)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn drag_follows_pointer_with_resistance() {
        let mut c = controller();
        c.handle_pointer(PointerEvent::start(700.0, ms(0))).unwrap();
        c.handle_pointer(PointerEvent::moved(500.0, -200.0, ms(16))).unwrap();
        assert_eq!(c.height(), 300.0);
        assert_eq!(c.state().target_snap, SnapPoint::Expanded);

        // 30 px below collapsed: 100 - 30 / (1 + 0.02 * 30).
        c.handle_pointer(PointerEvent::moved(730.0, 30.0, ms(32))).unwrap();
        assert!((c.height() - 81.25).abs() < 1e-9);
        assert_eq!(c.state().target_snap, SnapPoint::Collapsed);
    }

    #[test]
    fn move_without_start_is_rejected() {
        let mut c = controller();
        let before = c.state();
        assert_eq!(
            c.handle_pointer(PointerEvent::moved(500.0, -10.0, ms(16))),
            Err(SampleRejection::NoActiveGesture)
        );
        assert_eq!(c.state(), before);
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn non_finite_start_does_not_interrupt_settle() {
        let mut c = controller();
        c.expand();
        c.tick(FRAME);
        let before = c.state();
        assert!(c.handle_pointer(PointerEvent::start(f64::NAN, ms(0))).is_err());
        assert_eq!(c.state(), before);
        assert_eq!(c.phase(), Phase::Settling);
    }

    #[test]
    fn expand_settles_and_reports_once() {
        let mut c = controller();
        assert!(c.expand());
        settle(&mut c);
        assert_eq!(c.height(), 600.0);
        assert_eq!(c.state().last_settled, SnapPoint::Expanded);
        let reached = c
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, PanelEvent::SnapPointReached { .. }))
            .count();
        assert_eq!(reached, 1);
    }

    #[test]
    fn commands_ignored_while_dragging() {
        let mut c = controller();
        c.handle_pointer(PointerEvent::start(700.0, ms(0))).unwrap();
        assert!(!c.expand());
        assert!(!c.toggle());
        assert_eq!(c.phase(), Phase::Dragging);
    }

    #[test]
    fn toggle_flips_target() {
        let mut c = controller();
        c.toggle();
        assert_eq!(c.state().target_snap, SnapPoint::Expanded);
        c.toggle();
        assert_eq!(c.state().target_snap, SnapPoint::Collapsed);
        settle(&mut c);
        assert_eq!(c.height(), 100.0);
    }

    #[test]
    fn tick_is_noop_when_idle() {
        let mut c = controller();
        let version = c.snapshot_version();
        c.tick(FRAME);
        assert_eq!(c.snapshot_version(), version);
    }

    #[test]
    fn subscribers_see_every_change() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut c = controller();
        let heights = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&heights);
        let _sub = c.subscribe(move |s| sink.borrow_mut().push(s.height()));
        c.expand();
        settle(&mut c);
        let heights = heights.borrow();
        assert!(heights.len() > 2);
        assert_eq!(heights.last().copied(), Some(600.0));
        assert!(heights.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn recover_rests_on_last_settled() {
        let mut c = controller();
        c.expand();
        c.tick(FRAME);
        c.drain_events();
        c.recover();
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.height(), 100.0);
        assert_eq!(
            c.drain_events(),
            vec![
                PanelEvent::Recovered {
                    point: SnapPoint::Collapsed
                },
                PanelEvent::PhaseChanged {
                    from: Phase::Settling,
                    to: Phase::Idle
                },
            ]
        );
        // Nothing left to drive the height.
        c.tick(FRAME);
        assert_eq!(c.height(), 100.0);
    }
}
