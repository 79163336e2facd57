use std::path::PathBuf;

use snapdrawer_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid drawer config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse script: {0}")]
    ScriptParse(#[source] serde_json::Error),
    #[error("invalid script: {0}")]
    InvalidScript(String),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl HarnessError {
    /// Process exit code for the replay binary.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io { .. } | Self::Encode(_) | Self::Output(_) => 3,
            Self::ScriptParse(_) | Self::InvalidScript(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
