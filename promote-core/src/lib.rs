//! promote core library: domain types, configuration, subprocess runner,
//! run summary.
//!
//! - [`types`]: repository/branch references, commit ids, access token
//! - [`config`]: YAML config file and flag/file/default resolution
//! - [`command`]: [`CommandRunner`] and the timeout-aware [`SystemRunner`]
//! - [`summary`]: [`RunSummary`] tally and report
//! - [`error`]: [`ConfigError`], [`CommandError`]

pub mod command;
pub mod config;
pub mod error;
pub mod summary;
pub mod types;

pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use error::{CommandError, ConfigError};
pub use summary::{ItemOutcome, ItemStatus, RunSummary};
pub use types::{AccessToken, BranchRef, CommitId, PushMode, RepoLocation, RepoRef};
