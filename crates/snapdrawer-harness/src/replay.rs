//! Deterministic replay of a [`Script`] against a fresh panel controller.
//!
//! Every applied step and every frame produces one [`FrameRecord`]. Frame
//! time advances by a fixed step, so the same config and script always yield
//! byte-identical output.

use std::time::Duration;

use serde::Serialize;
use snapdrawer_core::{DrawerConfig, Phase};
use snapdrawer_runtime::{FixedStep, PanelController, PanelEvent, PanelSnapshot, PanelState};

use crate::error::Result;
use crate::script::{Script, Step};

/// What produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Input,
    Frame,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub kind: RecordKind,
    /// Index of the script step being applied.
    pub step: usize,
    /// Frames run so far.
    pub frame: u64,
    /// Whether the input was accepted (always true for frames).
    pub accepted: bool,
    pub snapshot: PanelSnapshot,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<PanelEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub name: Option<String>,
    pub frames: u64,
    pub rejected_inputs: usize,
    /// The frame budget ran out before the script finished.
    pub truncated: bool,
    pub final_state: PanelState,
}

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub frame: Duration,
    pub max_frames: u64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(16),
            max_frames: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub records: Vec<FrameRecord>,
    pub summary: ReplaySummary,
}

impl ReplayReport {
    /// JSON Lines: one record per line, then the summary.
    pub fn to_jsonl(&self) -> Result<String> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        out.push_str(&serde_json::to_string(&serde_json::json!({ "summary": self.summary }))?);
        out.push('\n');
        Ok(out)
    }
}

struct Replayer {
    panel: PanelController,
    clock: FixedStep,
    max_frames: u64,
    frames: u64,
    records: Vec<FrameRecord>,
    rejected_inputs: usize,
}

impl Replayer {
    fn budget_left(&self) -> bool {
        self.frames < self.max_frames
    }

    fn frame(&mut self, step: usize) {
        self.panel.tick_from(&mut self.clock);
        self.frames += 1;
        self.record(RecordKind::Frame, step, true);
    }

    fn record(&mut self, kind: RecordKind, step: usize, accepted: bool) {
        self.records.push(FrameRecord {
            kind,
            step,
            frame: self.frames,
            accepted,
            snapshot: self.panel.snapshot(),
            events: self.panel.drain_events(),
        });
    }

    /// Returns false once the frame budget is exhausted.
    fn apply(&mut self, index: usize, step: &Step) -> bool {
        match *step {
            Step::Pointer { .. } => {
                let accepted = step
                    .pointer_event()
                    .is_some_and(|event| self.panel.handle_pointer(event).is_ok());
                if !accepted {
                    self.rejected_inputs += 1;
                }
                self.record(RecordKind::Input, index, accepted);
            }
            Step::Command { command } => {
                let accepted = self.panel.command(command.into());
                if !accepted {
                    self.rejected_inputs += 1;
                }
                self.record(RecordKind::Input, index, accepted);
            }
            Step::Viewport { height } => {
                let accepted = self.panel.set_viewport_height(height).is_ok();
                if !accepted {
                    self.rejected_inputs += 1;
                }
                self.record(RecordKind::Input, index, accepted);
            }
            Step::Advance { frames } => {
                for _ in 0..frames {
                    if !self.budget_left() {
                        return false;
                    }
                    self.frame(index);
                }
            }
            Step::Settle => {
                while self.panel.phase() != Phase::Idle {
                    if !self.budget_left() {
                        return false;
                    }
                    self.frame(index);
                }
            }
        }
        true
    }
}

/// Replay `script` against a controller built from `config`.
pub fn replay(config: DrawerConfig, script: &Script, options: &ReplayOptions) -> Result<ReplayReport> {
    let panel = PanelController::new(config)?;
    let mut replayer = Replayer {
        panel,
        clock: FixedStep::new(options.frame),
        max_frames: options.max_frames,
        frames: 0,
        records: Vec::new(),
        rejected_inputs: 0,
    };

    let _span = tracing::info_span!(
        "replay",
        name = script.name.as_deref().unwrap_or("unnamed"),
        steps = script.steps.len()
    )
    .entered();

    let mut truncated = false;
    for (index, step) in script.steps.iter().enumerate() {
        if !replayer.apply(index, step) {
            tracing::warn!(step = index, frames = replayer.frames, "frame budget exhausted");
            truncated = true;
            break;
        }
    }

    let summary = ReplaySummary {
        name: script.name.clone(),
        frames: replayer.frames,
        rejected_inputs: replayer.rejected_inputs,
        truncated,
        final_state: replayer.panel.state(),
    };
    tracing::info!(
        frames = summary.frames,
        rejected = summary.rejected_inputs,
        truncated,
        "replay finished"
    );
    Ok(ReplayReport {
        records: replayer.records,
        summary,
    })
}
