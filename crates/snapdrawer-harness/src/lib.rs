#![forbid(unsafe_code)]

//! Script replay for snapdrawer panels.
//!
//! Loads a [`DrawerConfig`](snapdrawer_core::DrawerConfig) and a JSON
//! [`Script`], drives a [`PanelController`](snapdrawer_runtime::PanelController)
//! with a fixed frame clock, and reports every frame as JSON Lines. Used by
//! the `drawer-replay` binary and by regression tests.

pub mod cli;
pub mod error;
pub mod replay;
pub mod script;

pub use error::{HarnessError, Result};
pub use replay::{FrameRecord, RecordKind, ReplayOptions, ReplayReport, ReplaySummary, replay};
pub use script::{Script, ScriptCommand, Step};
