//! Branch promotion across every repository of an organization.
//!
//! For each listed repository the source branch head is compared with each
//! target branch head. Repositories where any target differs are relayed with
//! [`sync_branches`]. Each repository is handled independently: a failure is
//! recorded in the summary and the run moves on.

use std::io::Write;

use promote_core::{
    config::BranchSettings, AccessToken, CommandRunner, CommitId, ItemStatus, RunSummary,
};
use promote_forge::{list_repositories, Forge, ForgeError};

use crate::error::{output_err, SyncError};
use crate::git::{sync_branches, BranchSyncRequest};

/// Per-run switches not part of the persistent configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compare and report only; start no git process.
    pub dry_run: bool,
    pub show_diff: bool,
}

/// Drives branch promotion for one organization.
pub struct BranchPromotion<'a> {
    pub settings: &'a BranchSettings,
    pub token: &'a AccessToken,
    pub forge: &'a dyn Forge,
    pub runner: &'a dyn CommandRunner,
    pub options: RunOptions,
}

/// Head comparison for one repository.
struct Heads {
    source: CommitId,
    /// Target branches whose head differs from `source`.
    stale: Vec<String>,
}

impl BranchPromotion<'_> {
    /// Process every repository. Only a failure to list the organization is
    /// returned as `Err`; everything else lands in the summary.
    pub fn run(&self, out: &mut dyn Write) -> Result<RunSummary, SyncError> {
        let settings = self.settings;
        let repos = list_repositories(self.forge, &settings.source, &settings.exclude)?;
        let mut summary = RunSummary::new("packages");

        for name in repos {
            let (needs_sync, status) = self.promote_repo(&name, out)?;
            summary.record(name, needs_sync, status);
            writeln!(out).map_err(output_err)?;
        }
        Ok(summary)
    }

    fn promote_repo(&self, name: &str, out: &mut dyn Write) -> Result<(bool, ItemStatus), SyncError> {
        let settings = self.settings;
        let source_repo = settings.source.repo(name);
        let target_repo = settings.target.repo(name);
        writeln!(out, "Processing package {source_repo} ...").map_err(output_err)?;

        let heads = match self.compare_heads(name, out) {
            Ok(heads) => heads,
            Err(CompareError::Output(err)) => return Err(SyncError::Output(err)),
            Err(CompareError::Forge(err)) => {
                tracing::warn!("{name}: {err}");
                writeln!(out, "---> ERROR: cannot get commit hash: {err}").map_err(output_err)?;
                writeln!(out, "     Check the configured access token.").map_err(output_err)?;
                return Ok((false, ItemStatus::Failed { reason: err.to_string() }));
            }
        };

        if heads.stale.is_empty() {
            writeln!(out, "---> Nothing to sync here.").map_err(output_err)?;
            return Ok((false, ItemStatus::UpToDate));
        }

        for branch in &heads.stale {
            writeln!(out, "---> We need to sync branch '{branch}' here!").map_err(output_err)?;
        }
        if self.options.dry_run {
            writeln!(out, "---> [dry-run] would push {} to {target_repo}", heads.source)
                .map_err(output_err)?;
            return Ok((true, ItemStatus::WouldSync));
        }

        let source_branch = source_repo.branch(&settings.source_branch);
        let request = BranchSyncRequest {
            source: &source_branch,
            target: &target_repo,
            target_branches: &settings.target_branches,
            push_mode: settings.push_mode,
            object_format: &settings.object_format,
            token: self.token,
            timeout: settings.timeout,
            show_diff: self.options.show_diff,
        };

        match sync_branches(self.runner, &request, out) {
            Ok(()) => {
                writeln!(
                    out,
                    "---> Pushed '{}' from {} to {:?} at {}",
                    settings.source_branch, settings.source, settings.target_branches, settings.target
                )
                .map_err(output_err)?;
                writeln!(out, "---> Successfully synced!").map_err(output_err)?;
                Ok((true, ItemStatus::Synced))
            }
            Err(SyncError::Output(err)) => Err(SyncError::Output(err)),
            Err(err) => {
                tracing::warn!("{name}: sync failed: {err}");
                writeln!(out, "---> ERROR: {err}").map_err(output_err)?;
                if let Some((stdout, stderr)) = err.command_output() {
                    writeln!(out, "     STDOUT: {}", stdout.trim_end()).map_err(output_err)?;
                    writeln!(out, "     STDERR: {}", stderr.trim_end()).map_err(output_err)?;
                }
                Ok((true, ItemStatus::Failed { reason: err.to_string() }))
            }
        }
    }

    fn compare_heads(&self, name: &str, out: &mut dyn Write) -> Result<Heads, CompareError> {
        let settings = self.settings;
        let source = self
            .forge
            .branch_head(&settings.source.repo(name).branch(&settings.source_branch), None)?;
        writeln!(out, "---> HEAD ({}): {source}", settings.source_branch)?;

        let mut stale = Vec::new();
        for branch in &settings.target_branches {
            let head = self
                .forge
                .branch_head(&settings.target.repo(name).branch(branch), Some(self.token))?;
            writeln!(out, "---> HEAD ({branch}): {head}")?;
            if head != source {
                stale.push(branch.clone());
            }
        }
        Ok(Heads { source, stale })
    }
}

/// Failure while comparing heads: either the API or the report sink.
#[derive(Debug, thiserror::Error)]
enum CompareError {
    #[error(transparent)]
    Forge(#[from] ForgeError),
    #[error(transparent)]
    Output(#[from] std::io::Error),
}
