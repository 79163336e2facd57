#![forbid(unsafe_code)]

//! Panel phase: which driver currently owns the height.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What is driving the panel height right now.
///
/// Lifecycle: `Idle → Dragging → Settling → Idle`, or `Idle/Settling →
/// Settling → Idle` for explicit commands. There is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    /// At rest on the last settled snap point.
    #[default]
    Idle,
    /// Height follows the pointer through boundary resistance.
    Dragging,
    /// Height follows the settle spring.
    Settling,
}

impl Phase {
    /// Whether the height may change without new input.
    #[inline]
    #[must_use]
    pub fn is_moving(self) -> bool {
        !matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging => "dragging",
            Self::Settling => "settling",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
