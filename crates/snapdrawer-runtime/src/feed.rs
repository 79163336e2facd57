#![forbid(unsafe_code)]

//! Same-thread snapshot feed for UI-thread listeners.
//!
//! [`SnapshotFeed`] holds the controller's latest [`PanelSnapshot`] and calls
//! every live listener when a differing snapshot is published. Listeners are
//! held weakly: dropping the returned [`Subscription`] detaches them.
//!
//! Only the controller publishes, through `&mut self`, so a listener can
//! never feed a value back into the panel.
//!
//! # Failure Modes
//!
//! - **Listener leak**: guards stored forever keep their callbacks alive.
//!   Dead entries are pruned on the next publish.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info_span};
use web_time::Instant;

use crate::event::PanelSnapshot;

type Listener = Rc<dyn Fn(&PanelSnapshot)>;

/// The latest snapshot plus the listeners waiting for the next one.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each publish that changes the
///    snapshot, and never otherwise.
/// 2. Listeners are called in subscription order with the new snapshot.
pub struct SnapshotFeed {
    current: PanelSnapshot,
    version: u64,
    listeners: RefCell<Vec<Weak<dyn Fn(&PanelSnapshot)>>>,
}

impl std::fmt::Debug for SnapshotFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotFeed")
            .field("phase", &self.current.phase())
            .field("height", &self.current.height())
            .field("version", &self.version)
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl SnapshotFeed {
    #[must_use]
    pub fn new(initial: PanelSnapshot) -> Self {
        Self {
            current: initial,
            version: 0,
            listeners: RefCell::new(Vec::new()),
        }
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> &PanelSnapshot {
        &self.current
    }

    /// Number of changes published so far.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Listeners registered, including dropped ones not yet pruned.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Register `listener` for every later change.
    pub fn subscribe(&self, listener: impl Fn(&PanelSnapshot) + 'static) -> Subscription {
        let strong: Listener = Rc::new(listener);
        self.listeners.borrow_mut().push(Rc::downgrade(&strong));
        Subscription { _listener: strong }
    }

    /// Replace the snapshot. Returns false, without notifying, when
    /// `snapshot` equals the current one.
    pub fn publish(&mut self, snapshot: PanelSnapshot) -> bool {
        if self.current == snapshot {
            return false;
        }
        self.current = snapshot;
        self.version += 1;
        self.notify();
        true
    }

    fn notify(&self) {
        let live: Vec<Listener> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|w| w.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        if live.is_empty() {
            return;
        }

        let started = Instant::now();
        let _span = info_span!(
            "panel.snapshot.notify",
            version = self.version,
            phase = %self.current.phase(),
            height = self.current.height(),
            listeners = live.len() as u64,
            duration_us = tracing::field::Empty
        )
        .entered();

        for listener in &live {
            listener(&self.current);
        }

        let duration_us = started.elapsed().as_micros() as u64;
        tracing::Span::current().record("duration_us", duration_us);
        debug!(duration_us, "snapshot propagated");
    }
}

/// Keeps a listener attached. Drop it to unsubscribe.
pub struct Subscription {
    _listener: Listener,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PanelState;
    use snapdrawer_core::{Phase, PresentationConfig, PresentationSignals, SnapPoint, SnapPoints};
    use std::cell::Cell;

    fn snapshot(phase: Phase, height: f64) -> PanelSnapshot {
        let points = SnapPoints::new(100.0, 600.0).expect("valid points");
        PanelSnapshot {
            state: PanelState {
                phase,
                height,
                target_snap: SnapPoint::Collapsed,
                last_settled: SnapPoint::Collapsed,
            },
            collapsed_height: 100.0,
            expanded_height: 600.0,
            signals: PresentationSignals::derive(
                height,
                phase,
                &points,
                &PresentationConfig::default(),
            ),
        }
    }

    #[test]
    fn unchanged_snapshot_is_not_published() {
        let mut feed = SnapshotFeed::new(snapshot(Phase::Idle, 100.0));
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let _sub = feed.subscribe(move |_| c.set(c.get() + 1));

        assert!(!feed.publish(snapshot(Phase::Idle, 100.0)));
        assert_eq!(calls.get(), 0);
        assert_eq!(feed.version(), 0);

        assert!(feed.publish(snapshot(Phase::Settling, 100.0)));
        assert_eq!(calls.get(), 1);
        assert_eq!(feed.version(), 1);
    }

    #[test]
    fn listeners_see_new_height_in_order() {
        let mut feed = SnapshotFeed::new(snapshot(Phase::Idle, 100.0));
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::clone(&log);
        let b = Rc::clone(&log);
        let _s1 = feed.subscribe(move |s| a.borrow_mut().push(("layout", s.height())));
        let _s2 = feed.subscribe(move |s| b.borrow_mut().push(("overlay", s.height())));
        feed.publish(snapshot(Phase::Dragging, 180.0));
        assert_eq!(*log.borrow(), vec![("layout", 180.0), ("overlay", 180.0)]);
        assert_eq!(feed.current().phase(), Phase::Dragging);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let mut feed = SnapshotFeed::new(snapshot(Phase::Idle, 100.0));
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let sub = feed.subscribe(move |_| c.set(c.get() + 1));
        feed.publish(snapshot(Phase::Dragging, 120.0));
        drop(sub);
        feed.publish(snapshot(Phase::Dragging, 140.0));
        assert_eq!(calls.get(), 1);
        assert_eq!(feed.listener_count(), 0);
    }
}
