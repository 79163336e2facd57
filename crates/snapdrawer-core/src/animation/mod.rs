#![forbid(unsafe_code)]

//! Frame-driven animation primitives.
//!
//! Animations here are advanced explicitly with a frame delta; they never
//! read a clock themselves. The runtime decides where deltas come from.

pub mod spring;

use std::time::Duration;

pub use spring::Spring;

/// A value that evolves over time when ticked.
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has come to rest.
    fn is_complete(&self) -> bool;
}
