//! Error types for promote-core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the offending file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    #[error("access token missing: set the {var} environment variable")]
    MissingToken { var: String },

    #[error("access token in {var} is still the placeholder value; set a real token")]
    PlaceholderToken { var: String },

    /// A required setting was given neither on the command line nor in the config file.
    #[error("missing required setting '{0}' (pass it as a flag or set it in the config file)")]
    Missing(&'static str),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Errors from running an external command.
///
/// Every `command` string is already redacted: secrets registered on the
/// [`CommandSpec`](crate::command::CommandSpec) are replaced with `***`.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },

    #[error("`{command}` exited with {}", code.map_or_else(|| "signal".to_string(), |c| format!("status {c}")))]
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl CommandError {
    /// Captured (stdout, stderr) for failures that produced output.
    pub fn output(&self) -> Option<(&str, &str)> {
        match self {
            CommandError::Failed { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
