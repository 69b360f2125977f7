pub mod branches;
pub mod obs;
pub mod prjconf;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use promote_core::{
    config::{BranchOverrides, FileConfig},
    RunSummary,
};

// ---------------------------------------------------------------------------
// Shared git-hosting location arguments
// ---------------------------------------------------------------------------

/// Where branches come from and go to. Unset flags fall back to the config
/// file, then to built-in defaults.
#[derive(Args, Debug, Default)]
pub struct LocationArgs {
    /// Git hosting server of the source organization.
    #[arg(long, value_name = "HOST")]
    pub source_server: Option<String>,

    /// Source organization.
    #[arg(long, value_name = "ORG")]
    pub source_org: Option<String>,

    /// Branch to promote.
    #[arg(long, value_name = "BRANCH")]
    pub source_branch: Option<String>,

    /// Target server (defaults to the source server).
    #[arg(long, value_name = "HOST")]
    pub target_server: Option<String>,

    /// Target organization (defaults to the source organization).
    #[arg(long, value_name = "ORG")]
    pub target_org: Option<String>,

    /// Branch to update; repeat for several.
    #[arg(long = "target-branch", value_name = "BRANCH")]
    pub target_branches: Vec<String>,

    /// Environment variable holding the access token.
    #[arg(long, value_name = "VAR")]
    pub token_env: Option<String>,

    /// Timeout for each external call, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

impl LocationArgs {
    pub fn overrides(self) -> BranchOverrides {
        BranchOverrides {
            source_server: self.source_server,
            source_org: self.source_org,
            source_branch: self.source_branch,
            target_server: self.target_server,
            target_org: self.target_org,
            target_branches: self.target_branches,
            token_env: self.token_env,
            timeout_secs: self.timeout_secs,
            ..Default::default()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    FileConfig::discover(path).context("could not load configuration")
}

/// Print the summary block and a colored verdict; returns the exit code.
pub fn finish(summary: &RunSummary, out: &mut dyn Write) -> Result<i32> {
    summary.render(out).context("could not write summary")?;
    let errored = summary.errored().len();
    let verdict = if errored == 0 {
        format!("✓ {} {} processed", summary.processed(), summary.noun)
            .green()
            .to_string()
    } else {
        format!("✗ {errored} {} failed", summary.noun)
            .red()
            .bold()
            .to_string()
    };
    writeln!(out, "{verdict}").context("could not write summary")?;
    out.flush().context("could not flush output")?;
    Ok(summary.exit_code())
}
