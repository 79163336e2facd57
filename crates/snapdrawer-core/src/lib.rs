#![forbid(unsafe_code)]

//! Core: physics, gesture sampling, and pure mappings for snap-point panels.
//!
//! # Role in snapdrawer
//! `snapdrawer-core` holds every piece of the panel controller that can be
//! expressed without owning mutable panel state. The stateful controller in
//! `snapdrawer-runtime` composes these pieces under a single phase gate.
//!
//! # Primary responsibilities
//! - **GestureSampler**: normalizes raw pointer motion into timestamped samples.
//! - **Boundary resistance**: rubber-banding past the travel limits.
//! - **SnapResolver**: picks a rest position from the end-of-gesture state.
//! - **Spring**: damped harmonic oscillator used by the settle animator.
//! - **Presentation**: continuous derived signals for renderers.
//! - **DrawerConfig**: every tunable, validated up front.
//!
//! # How it fits in the system
//! Nothing in this crate schedules work or holds references to a host. All
//! functions are deterministic in their inputs, which keeps the runtime's
//! replay tests exact.

pub mod animation;
pub mod config;
pub mod gesture;
pub mod phase;
pub mod presentation;
pub mod resistance;
pub mod snap;

pub use config::{ConfigError, DrawerConfig, ExpandedHeight, SpringConfig};
pub use gesture::{
    GestureSample, GestureSampler, GestureSummary, PointerEvent, PointerPhase, SampleRejection,
};
pub use phase::Phase;
pub use presentation::{PresentationConfig, PresentationSignals, Rgb, interpolate};
pub use resistance::{ResistanceCurve, resist};
pub use snap::{ReleaseState, SnapPoint, SnapPoints, SnapResolver};
