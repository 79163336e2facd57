#![forbid(unsafe_code)]

//! Outbound panel events and the published snapshot type.

#[cfg(feature = "serde")]
use serde::Serialize;

use snapdrawer_core::{Phase, PresentationSignals, SnapPoint};

/// Discrete things a host may want to react to.
///
/// Events are queued by the controller and drained by the host with
/// [`crate::PanelController::drain_events`]. Continuous values (height,
/// signals) go through snapshots instead.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum PanelEvent {
    /// The driver of the height changed.
    PhaseChanged { from: Phase, to: Phase },
    /// A release was resolved to a snap point.
    GestureResolved {
        start: SnapPoint,
        target: SnapPoint,
        /// Pointer velocity at release (px/s, positive = downward).
        velocity: f64,
        /// Absolute pointer distance covered by the gesture.
        distance: f64,
        /// False for taps and sub-dead-zone jitter.
        was_significant_motion: bool,
    },
    /// A settle finished on `point`.
    SnapPointReached { point: SnapPoint, height: f64 },
    /// A fault was detected and the panel was reset onto `point`.
    Recovered { point: SnapPoint },
}

/// Read-only state of the panel: who drives it, where it is, where it's going.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PanelState {
    pub phase: Phase,
    pub height: f64,
    /// Live target while dragging, destination while settling, and the
    /// settled point while idle.
    pub target_snap: SnapPoint,
    pub last_settled: SnapPoint,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PanelSnapshot {
    pub state: PanelState,
    pub collapsed_height: f64,
    pub expanded_height: f64,
    pub signals: PresentationSignals,
}

impl PanelSnapshot {
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.state.height
    }
}
