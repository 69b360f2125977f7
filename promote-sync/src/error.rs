//! Error types for promote-sync.

use thiserror::Error;

use promote_core::{CommandError, ConfigError};
use promote_forge::ForgeError;
use promote_obs::ObsError;

/// All errors that can arise from promotion runs.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("hosting API error: {0}")]
    Forge(#[from] ForgeError),

    #[error("command error: {0}")]
    Command(#[from] CommandError),

    #[error("build service error: {0}")]
    Obs(#[from] ObsError),

    /// Creating the scratch directory for git failed.
    #[error("cannot create working directory: {0}")]
    Workdir(#[source] std::io::Error),

    /// Writing the progress log failed.
    #[error("cannot write report: {0}")]
    Output(#[source] std::io::Error),
}

impl SyncError {
    /// Captured (stdout, stderr) when a command failed with output.
    pub fn command_output(&self) -> Option<(&str, &str)> {
        match self {
            SyncError::Command(err) => err.output(),
            SyncError::Obs(ObsError::Command(err)) => err.output(),
            _ => None,
        }
    }
}

pub(crate) fn output_err(source: std::io::Error) -> SyncError {
    SyncError::Output(source)
}
