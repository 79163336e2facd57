use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use snapdrawer_core::DrawerConfig;

use crate::error::{HarnessError, Result};
use crate::replay::{ReplayOptions, replay};
use crate::script::Script;

#[derive(Debug, Parser)]
#[command(
    name = "drawer-replay",
    about = "Replay a pointer/command script against a snap-point panel and print JSONL frames",
    version
)]
pub struct Cli {
    /// Drawer config (TOML, or JSON with a .json extension). Defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replay script (JSON).
    #[arg(long)]
    pub script: PathBuf,

    /// Frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    pub frame_ms: u64,

    /// Stop after this many frames.
    #[arg(long, default_value_t = 10_000)]
    pub max_frames: u64,

    /// Print only the summary line.
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn load_config(path: Option<&PathBuf>) -> Result<DrawerConfig> {
    let Some(path) = path else {
        return Ok(DrawerConfig::default());
    };
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let config = if is_json {
        DrawerConfig::from_json_file(path)?
    } else {
        DrawerConfig::from_toml_file(path)?
    };
    Ok(config)
}

pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let script = Script::from_json_file(&cli.script)?;
    let options = ReplayOptions {
        frame: Duration::from_millis(cli.frame_ms),
        max_frames: cli.max_frames,
    };
    let report = replay(config, &script, &options)?;

    if cli.summary_only {
        let line = serde_json::to_string(&serde_json::json!({ "summary": report.summary }))?;
        writeln!(out, "{line}").map_err(HarnessError::Output)?;
    } else {
        out.write_all(report.to_jsonl()?.as_bytes())
            .map_err(HarnessError::Output)?;
    }
    out.flush().map_err(HarnessError::Output)
}
