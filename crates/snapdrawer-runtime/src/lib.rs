#![forbid(unsafe_code)]

//! Runtime: the stateful panel controller built on `snapdrawer-core`.
//!
//! # Role in snapdrawer
//! `snapdrawer-runtime` owns the single mutable panel state. It accepts
//! pointer events, commands, frame ticks, and viewport changes, and publishes
//! snapshots and discrete events for renderers.
//!
//! # Primary responsibilities
//! - **PanelController**: phase gate over the gesture and settle drivers.
//! - **SpringAnimator**: interruptible settle with exactly-once completion.
//! - **SnapshotFeed / SnapshotReader**: same-thread and cross-thread readers.
//! - **TickSource**: fixed-step and wall-clock frame deltas.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use snapdrawer_core::{DrawerConfig, Phase, PointerEvent};
//! use snapdrawer_runtime::PanelController;
//!
//! let mut panel = PanelController::new(DrawerConfig::fixed(100.0, 600.0)).unwrap();
//! panel.handle_pointer(PointerEvent::start(700.0, Duration::ZERO)).unwrap();
//! panel.handle_pointer(PointerEvent::moved(400.0, -300.0, Duration::from_millis(200))).unwrap();
//! panel.handle_pointer(PointerEvent::end(400.0, -300.0, Duration::from_millis(400))).unwrap();
//! while panel.phase() != Phase::Idle {
//!     panel.tick(Duration::from_millis(16));
//! }
//! assert_eq!(panel.height(), 600.0);
//! ```

pub mod clock;
pub mod event;
pub mod feed;
pub mod panel;
pub mod settle;
pub mod snapshot_store;

pub use clock::{FixedStep, TickSource, WallClock};
pub use event::{PanelEvent, PanelSnapshot, PanelState};
pub use feed::{SnapshotFeed, Subscription};
pub use panel::{PanelCommand, PanelController};
pub use settle::{Origin, SettleHandle, SettleStep, SpringAnimator};
pub use snapshot_store::{Published, SnapshotReader};
