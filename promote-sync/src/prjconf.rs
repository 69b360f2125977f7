//! Promotion of the project configuration kept in the git-hosted project
//! repository (`_ObsPrj`): the `_config` file of the source branch is
//! committed onto each target branch when it differs.

use std::io::Write;
use std::path::Path;

use promote_core::{
    config::BranchSettings, AccessToken, CommandError, CommandRunner, ConfigError, ItemStatus, RunSummary,
};

use crate::error::{output_err, SyncError};
use crate::git::{release, scratch_dir, Git};

/// Repository holding the project-level files.
pub const PROJECT_REPO: &str = "_ObsPrj";
/// Project configuration file inside [`PROJECT_REPO`].
pub const CONFIG_FILE: &str = "_config";

pub struct ProjectConfigPromotion<'a> {
    settings: &'a BranchSettings,
    token: &'a AccessToken,
    runner: &'a dyn CommandRunner,
    dry_run: bool,
}

impl<'a> ProjectConfigPromotion<'a> {
    /// The project repository is promoted within one organization, so the
    /// target location must equal the source location.
    pub fn new(
        settings: &'a BranchSettings,
        token: &'a AccessToken,
        runner: &'a dyn CommandRunner,
        dry_run: bool,
    ) -> Result<Self, ConfigError> {
        if settings.source != settings.target {
            return Err(ConfigError::Invalid(format!(
                "{PROJECT_REPO} config promotion works within one organization, got {} -> {}",
                settings.source, settings.target
            )));
        }
        Ok(Self {
            settings,
            token,
            runner,
            dry_run,
        })
    }

    pub fn run(&self, out: &mut dyn Write) -> Result<RunSummary, SyncError> {
        let repo = self.settings.source.repo(PROJECT_REPO);
        let mut summary = RunSummary::new("project configs");

        for target in &self.settings.target_branches {
            writeln!(
                out,
                "Processing {repo} ({} -> {target}) ...",
                self.settings.source_branch
            )
            .map_err(output_err)?;

            let workdir = scratch_dir("promote-prjconf-")?;
            let result = self.promote(workdir.path(), target, out);
            release(workdir);

            let (needs_sync, status) = match result {
                Ok(outcome) => outcome,
                Err(SyncError::Output(err)) => return Err(SyncError::Output(err)),
                Err(err) => {
                    tracing::warn!("{PROJECT_REPO} {target}: {err}");
                    writeln!(out, "---> ERROR: {err}").map_err(output_err)?;
                    if let Some((stdout, stderr)) = err.command_output() {
                        writeln!(out, "     STDOUT: {}", stdout.trim_end()).map_err(output_err)?;
                        writeln!(out, "     STDERR: {}", stderr.trim_end()).map_err(output_err)?;
                    }
                    (true, ItemStatus::Failed { reason: err.to_string() })
                }
            };
            summary.record(format!("{PROJECT_REPO}:{target}"), needs_sync, status);
            writeln!(out).map_err(output_err)?;
        }
        Ok(summary)
    }

    fn promote(
        &self,
        dir: &Path,
        target: &str,
        out: &mut dyn Write,
    ) -> Result<(bool, ItemStatus), SyncError> {
        let source = self.settings.source_branch.as_str();
        let url = self.settings.source.repo(PROJECT_REPO).authenticated_url(self.token);
        let git = Git::new(self.runner, dir, self.settings.timeout, Some(self.token));

        git.run(["clone", url.as_str(), "-b", source, "."])?;
        git.run(["checkout", target])?;
        git.run(["checkout", source, "--", CONFIG_FILE])?;

        // `--quiet` exits 1 when the staged file differs.
        let staged = git.run_unchecked(["diff", "--cached", "--quiet", "--", CONFIG_FILE])?;
        match staged.code {
            Some(0) => {
                writeln!(out, "---> Nothing to promote here.").map_err(output_err)?;
                return Ok((false, ItemStatus::UpToDate));
            }
            Some(1) => {}
            _ => {
                let spec = git.spec(["diff", "--cached", "--quiet", "--", CONFIG_FILE]);
                return Err(CommandError::Failed {
                    command: spec.display(),
                    code: staged.code,
                    stdout: spec.redact(&staged.stdout),
                    stderr: spec.redact(&staged.stderr),
                }
                .into());
            }
        }

        let diff = git.run(["diff", "--staged"])?;
        writeln!(out, "---> Here is the diff:\n").map_err(output_err)?;
        write!(out, "{}", diff.stdout).map_err(output_err)?;

        if self.dry_run {
            writeln!(out, "---> [dry-run] would commit and push to '{target}'").map_err(output_err)?;
            return Ok((true, ItemStatus::WouldSync));
        }

        let message = format!("Merge changes from {source} branch");
        git.run(["commit", "-m", message.as_str()])?;
        git.run(["push", "origin", target])?;
        writeln!(out, "---> Promoted {CONFIG_FILE} to '{target}'").map_err(output_err)?;
        Ok((true, ItemStatus::Synced))
    }
}
