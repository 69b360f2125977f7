//! Error types for promote-obs.

use std::path::PathBuf;

use thiserror::Error;

use promote_core::CommandError;

/// Failures talking to the build service.
#[derive(Debug, Error)]
pub enum ObsError {
    /// `osc` failed, timed out, or could not be started.
    #[error("osc error: {0}")]
    Command(#[from] CommandError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ObsError {
    ObsError::Io {
        path: path.into(),
        source,
    }
}
