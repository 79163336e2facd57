//! Replay scripts: a JSON list of pointer events, commands, frame advances,
//! and viewport changes.
//!
//! ```json
//! {
//!   "name": "drag up and release",
//!   "steps": [
//!     { "op": "pointer", "phase": "start", "position": 700, "at_ms": 0 },
//!     { "op": "pointer", "phase": "move", "position": 400, "translation": -300, "at_ms": 200 },
//!     { "op": "pointer", "phase": "end", "position": 400, "translation": -300, "at_ms": 400 },
//!     { "op": "settle" }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use snapdrawer_core::{PointerEvent, PointerPhase};
use snapdrawer_runtime::PanelCommand;

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// One raw pointer event. Timestamps are script time, not frame time.
    Pointer {
        phase: PointerPhase,
        position: f64,
        #[serde(default)]
        translation: f64,
        at_ms: u64,
    },
    Command { command: ScriptCommand },
    /// Run this many frames.
    Advance { frames: u32 },
    /// Run frames until the panel is idle (bounded by the frame budget).
    Settle,
    Viewport { height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptCommand {
    Expand,
    Collapse,
    Toggle,
}

impl From<ScriptCommand> for PanelCommand {
    fn from(value: ScriptCommand) -> Self {
        match value {
            ScriptCommand::Expand => Self::Expand,
            ScriptCommand::Collapse => Self::Collapse,
            ScriptCommand::Toggle => Self::Toggle,
        }
    }
}

impl Step {
    /// The pointer event for a pointer step.
    #[must_use]
    pub fn pointer_event(&self) -> Option<PointerEvent> {
        match *self {
            Self::Pointer {
                phase,
                position,
                translation,
                at_ms,
            } => Some(PointerEvent::new(
                phase,
                position,
                translation,
                Duration::from_millis(at_ms),
            )),
            _ => None,
        }
    }
}

impl Script {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let script: Self = serde_json::from_str(s).map_err(HarnessError::ScriptParse)?;
        script.check()?;
        Ok(script)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Structural checks. Malformed pointer values (NaN, reordered
    /// timestamps) are left in on purpose: the controller must ignore them.
    fn check(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(HarnessError::InvalidScript("script has no steps".into()));
        }
        Ok(())
    }
}
