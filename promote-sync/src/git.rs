//! Branch Sync Executor: relay a source branch to target branches through a
//! throwaway bare repository.
//!
//! ```text
//! git init --bare --object-format=<fmt>
//! git remote add source https://<server>/<org>/<repo>
//! git remote add target https://<token>@<server>/<org>/<repo>
//! git fetch source refs/heads/<branch>:refs/heads/<branch>
//! git push [--force] target refs/heads/<branch>:refs/heads/<target>   (per target)
//! ```
//!
//! Refspecs are fully qualified so a tag sharing the branch name cannot make
//! them ambiguous.
//!
//! The scratch directory lives exactly as long as one call and is removed on
//! every exit path, taking the remote configuration with it.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use promote_core::{
    AccessToken, BranchRef, CommandError, CommandOutput, CommandRunner, CommandSpec, PushMode,
    RepoRef,
};
use tempfile::TempDir;

use crate::error::{output_err, SyncError};

/// `git` bound to one working directory.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    dir: &'a Path,
    timeout: Duration,
    token: Option<&'a AccessToken>,
}

impl<'a> Git<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        dir: &'a Path,
        timeout: Duration,
        token: Option<&'a AccessToken>,
    ) -> Self {
        Self {
            runner,
            dir,
            timeout,
            token,
        }
    }

    pub fn spec<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new("git")
            .args(args)
            .current_dir(self.dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .timeout(self.timeout);
        match self.token {
            Some(token) => spec.secret(token),
            None => spec,
        }
    }

    /// Run and fail on non-zero exit.
    pub fn run<I, S>(&self, args: I) -> Result<CommandOutput, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner.run_checked(&self.spec(args))
    }

    /// Run and hand back the exit code to the caller.
    pub fn run_unchecked<I, S>(&self, args: I) -> Result<CommandOutput, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner.run(&self.spec(args))
    }
}

/// Fresh scratch directory for one repository.
pub fn scratch_dir(prefix: &str) -> Result<TempDir, SyncError> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(SyncError::Workdir)
}

/// Remove `dir`, logging rather than failing if cleanup goes wrong.
pub fn release(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(err) = dir.close() {
        tracing::warn!("could not remove {}: {err}", path.display());
    }
}

/// Everything needed to relay one repository's source branch.
#[derive(Debug, Clone)]
pub struct BranchSyncRequest<'a> {
    pub source: &'a BranchRef,
    pub target: &'a RepoRef,
    pub target_branches: &'a [String],
    pub push_mode: PushMode,
    pub object_format: &'a str,
    pub token: &'a AccessToken,
    pub timeout: Duration,
    /// Print `git diff --stat` against each target before pushing.
    pub show_diff: bool,
}

/// Fetch `request.source` and push it to every target branch.
///
/// Stops at the first failing step; the scratch directory is removed either way.
pub fn sync_branches(
    runner: &dyn CommandRunner,
    request: &BranchSyncRequest<'_>,
    out: &mut dyn Write,
) -> Result<(), SyncError> {
    let workdir = scratch_dir("promote-sync-")?;
    let result = relay(runner, workdir.path(), request, out);
    release(workdir);
    result
}

fn relay(
    runner: &dyn CommandRunner,
    dir: &Path,
    request: &BranchSyncRequest<'_>,
    out: &mut dyn Write,
) -> Result<(), SyncError> {
    let git = Git::new(runner, dir, request.timeout, Some(request.token));
    let branch = request.source.branch.as_str();

    git.run([
        "init".to_string(),
        "--bare".to_string(),
        format!("--object-format={}", request.object_format),
    ])?;
    git.run([
        "remote".to_string(),
        "add".to_string(),
        "source".to_string(),
        request.source.repo.clone_url(),
    ])?;
    git.run([
        "remote".to_string(),
        "add".to_string(),
        "target".to_string(),
        request.target.authenticated_url(request.token),
    ])?;
    git.run([
        "fetch".to_string(),
        "source".to_string(),
        format!("refs/heads/{branch}:refs/heads/{branch}"),
    ])?;

    if request.show_diff {
        for target in request.target_branches {
            show_stat(&git, branch, target, out)?;
        }
    }

    for target in request.target_branches {
        let mut args = vec!["push".to_string()];
        if request.push_mode == PushMode::Force {
            args.push("--force".to_string());
        }
        args.push("target".to_string());
        args.push(format!("refs/heads/{branch}:refs/heads/{target}"));
        git.run(args)?;
        tracing::info!("pushed {branch} to {} ({target})", request.target);
    }
    Ok(())
}

/// Informational only: a target branch that cannot be fetched is not fatal here.
fn show_stat(git: &Git<'_>, branch: &str, target: &str, out: &mut dyn Write) -> Result<(), SyncError> {
    let fetched = git.run([
        "fetch".to_string(),
        "target".to_string(),
        format!("refs/heads/{target}:refs/remotes/target/{target}"),
    ]);
    if let Err(err) = fetched {
        tracing::warn!("cannot fetch target branch {target} for diff: {err}");
        writeln!(out, "---> (no diff: target branch '{target}' not fetched)").map_err(output_err)?;
        return Ok(());
    }
    let stat = git.run([
        "diff".to_string(),
        "--stat".to_string(),
        format!("refs/remotes/target/{target}"),
        format!("refs/heads/{branch}"),
    ])?;
    writeln!(out, "---> Diff against '{target}':").map_err(output_err)?;
    write!(out, "{}", stat.stdout).map_err(output_err)?;
    Ok(())
}
