//! Property-based invariant tests for the panel controller.
//!
//! ## Invariants
//!
//! 1. Starting a gesture while settling never moves the height.
//! 2. Phase changes chain (`from` equals the previous `to`) and only follow
//!    allowed edges.
//! 3. Every return to idle from settling reports exactly one snap point.
//! 4. Height stays finite, and pointer-driven heights stay within the
//!    resistance envelope.
//! 5. Arbitrarily many start/cancel cycles leave the panel able to settle.

use std::time::Duration;

use proptest::prelude::*;
use snapdrawer_core::{DrawerConfig, Phase, PointerEvent};
use snapdrawer_runtime::{PanelCommand, PanelController, PanelEvent};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone)]
enum Op {
    Start { position: f64 },
    Move { dy: f64, dt_ms: u64 },
    End { dt_ms: u64 },
    Cancel,
    Command(PanelCommand),
    Ticks(u8),
    Resize(f64),
}

fn arb_command() -> impl Strategy<Value = PanelCommand> {
    prop_oneof![
        Just(PanelCommand::Expand),
        Just(PanelCommand::Collapse),
        Just(PanelCommand::Toggle),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => (0.0f64..900.0).prop_map(|position| Op::Start { position }),
        4 => (-120.0f64..120.0, 1u64..80).prop_map(|(dy, dt_ms)| Op::Move { dy, dt_ms }),
        2 => (1u64..80).prop_map(|dt_ms| Op::End { dt_ms }),
        1 => Just(Op::Cancel),
        2 => arb_command().prop_map(Op::Command),
        3 => (1u8..40).prop_map(Op::Ticks),
        1 => (300.0f64..1_600.0).prop_map(Op::Resize),
    ]
}

/// Replays ops with monotonic timestamps and per-gesture translation.
struct Driver {
    panel: PanelController,
    now: Duration,
    origin: f64,
    position: f64,
}

impl Driver {
    fn new() -> Self {
        Self {
            panel: PanelController::new(DrawerConfig::default()).expect("valid config"),
            now: Duration::ZERO,
            origin: 0.0,
            position: 0.0,
        }
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Start { position } => {
                self.now += Duration::from_millis(1);
                self.origin = position;
                self.position = position;
                let _ = self.panel.handle_pointer(PointerEvent::start(position, self.now));
            }
            Op::Move { dy, dt_ms } => {
                self.now += Duration::from_millis(dt_ms);
                self.position += dy;
                let _ = self.panel.handle_pointer(PointerEvent::moved(
                    self.position,
                    self.position - self.origin,
                    self.now,
                ));
            }
            Op::End { dt_ms } => {
                self.now += Duration::from_millis(dt_ms);
                let _ = self.panel.handle_pointer(PointerEvent::end(
                    self.position,
                    self.position - self.origin,
                    self.now,
                ));
            }
            Op::Cancel => {
                self.now += Duration::from_millis(1);
                let _ = self.panel.handle_pointer(PointerEvent::cancel(
                    self.position,
                    self.position - self.origin,
                    self.now,
                ));
            }
            Op::Command(command) => {
                self.panel.command(command);
            }
            Op::Ticks(n) => {
                for _ in 0..n {
                    self.panel.tick(FRAME);
                    self.now += FRAME;
                }
            }
            Op::Resize(viewport) => {
                let _ = self.panel.set_viewport_height(viewport);
            }
        }
    }

    fn finish(&mut self) {
        if self.panel.phase() == Phase::Dragging {
            self.apply(&Op::End { dt_ms: 16 });
        }
        for _ in 0..1_000 {
            if self.panel.phase() == Phase::Idle {
                return;
            }
            self.panel.tick(FRAME);
        }
    }
}

fn allowed(from: Phase, to: Phase) -> bool {
    matches!(
        (from, to),
        (Phase::Idle, Phase::Dragging)
            | (Phase::Settling, Phase::Dragging)
            | (Phase::Dragging, Phase::Settling)
            | (Phase::Idle, Phase::Settling)
            | (Phase::Settling, Phase::Idle)
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // 1.
    #[test]
    fn interrupting_settle_never_jumps(
        command in arb_command(),
        ticks in 0u8..60,
        position in 0.0f64..900.0,
    ) {
        let mut d = Driver::new();
        d.apply(&Op::Command(PanelCommand::Expand));
        d.finish();
        d.apply(&Op::Command(command));
        d.apply(&Op::Ticks(ticks));

        let before = d.panel.height();
        let before_snapshot = d.panel.snapshot().height();
        d.apply(&Op::Start { position });
        prop_assert_eq!(d.panel.phase(), Phase::Dragging);
        prop_assert_eq!(d.panel.height(), before);
        prop_assert_eq!(d.panel.snapshot().height(), before_snapshot);
    }

    // 2–4.
    #[test]
    fn phase_changes_follow_the_state_machine(ops in prop::collection::vec(arb_op(), 1..80)) {
        let mut d = Driver::new();
        let mut events = Vec::new();
        for op in &ops {
            d.apply(op);
            let h = d.panel.height();
            prop_assert!(h.is_finite());
            if matches!(op, Op::Move { .. }) && d.panel.phase() == Phase::Dragging {
                let points = d.panel.snap_points();
                // 1/k for the default resistance strengths.
                prop_assert!(h >= points.collapsed() - 50.0 - 1e-9, "height {} below envelope", h);
                prop_assert!(h <= points.expanded() + 100.0 + 1e-9, "height {} above envelope", h);
            }
            events.extend(d.panel.drain_events());
        }
        d.finish();
        events.extend(d.panel.drain_events());
        prop_assert_eq!(d.panel.phase(), Phase::Idle);

        let mut current = Phase::Idle;
        let mut settle_completions = 0usize;
        let mut reached = 0usize;
        for event in &events {
            match *event {
                PanelEvent::PhaseChanged { from, to } => {
                    prop_assert_eq!(from, current);
                    prop_assert!(allowed(from, to), "illegal transition {:?} -> {:?}", from, to);
                    if (from, to) == (Phase::Settling, Phase::Idle) {
                        settle_completions += 1;
                    }
                    current = to;
                }
                PanelEvent::SnapPointReached { .. } => reached += 1,
                PanelEvent::Recovered { .. } => prop_assert!(false, "unexpected recovery"),
                PanelEvent::GestureResolved { .. } => {}
            }
        }
        prop_assert_eq!(current, Phase::Idle);
        prop_assert_eq!(settle_completions, reached);
    }

    // 5.
    #[test]
    fn start_cancel_cycles_stay_healthy(cycles in 1usize..400, tick_between in any::<bool>()) {
        let mut d = Driver::new();
        for i in 0..cycles {
            d.apply(&Op::Start { position: 500.0 });
            d.apply(&Op::Move { dy: if i % 2 == 0 { -80.0 } else { 80.0 }, dt_ms: 16 });
            d.apply(&Op::Cancel);
            if tick_between {
                d.apply(&Op::Ticks(1));
            }
        }
        d.finish();
        prop_assert_eq!(d.panel.phase(), Phase::Idle);
        prop_assert_eq!(d.panel.height(), d.panel.snap_points().collapsed());

        let settled = d
            .panel
            .drain_events()
            .iter()
            .filter(|e| matches!(e, PanelEvent::SnapPointReached { .. }))
            .count();
        prop_assert!(settled <= cycles);
    }
}
