#![forbid(unsafe_code)]

//! Cross-thread publication of panel snapshots.
//!
//! The controller is single-owner and `!Send` (its observers are `Rc`
//! callbacks). Renderers on another thread read the latest snapshot through
//! a [`SnapshotReader`] instead. Reads are wait-free via `arc-swap` and never
//! block the controller; each read is a complete snapshot, never a mix of two
//! frames.
//!
//! Only the controller can publish. Readers have no write path, which keeps
//! the controller the sole writer of panel state.

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

use crate::event::PanelSnapshot;

/// One published frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Published {
    /// Increments by 1 per publish, starting at 0 for the initial snapshot.
    pub sequence: u64,
    pub snapshot: PanelSnapshot,
}

#[derive(Debug)]
pub(crate) struct SnapshotStore {
    inner: ArcSwap<Published>,
}

impl SnapshotStore {
    pub(crate) fn new(initial: PanelSnapshot) -> Self {
        Self {
            inner: ArcSwap::from_pointee(Published {
                sequence: 0,
                snapshot: initial,
            }),
        }
    }

    /// Single writer: load-then-store cannot race another publish.
    pub(crate) fn publish(&self, snapshot: PanelSnapshot) {
        let sequence = self.inner.load().sequence + 1;
        self.inner.store(Arc::new(Published { sequence, snapshot }));
    }
}

/// Read handle for the latest published snapshot. `Send + Sync`, cheap to clone.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    store: Arc<SnapshotStore>,
}

impl SnapshotReader {
    pub(crate) fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    /// Copy of the latest snapshot.
    #[inline]
    #[must_use]
    pub fn load(&self) -> PanelSnapshot {
        self.store.inner.load().snapshot
    }

    /// Latest snapshot with its sequence number, without copying.
    #[must_use]
    pub fn load_ref(&self) -> Guard<Arc<Published>> {
        self.store.inner.load()
    }

    /// Sequence number of the latest publish.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.store.inner.load().sequence
    }
}
