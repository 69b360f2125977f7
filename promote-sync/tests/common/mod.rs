//! Test doubles shared by the promote-sync integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use promote_core::{
    config::BranchSettings, AccessToken, BranchRef, CommandError, CommandOutput, CommandRunner,
    CommandSpec, CommitId, PushMode, RepoLocation,
};
use promote_forge::{Forge, ForgeError, RepoEntry};

// ---------------------------------------------------------------------------
// Forge stub
// ---------------------------------------------------------------------------

/// Serves fixed listing pages and branch heads keyed by `org/repo@branch`.
#[derive(Default)]
pub struct StubForge {
    pub pages: Vec<Vec<String>>,
    pub heads: HashMap<String, String>,
    pub lookups: RefCell<Vec<String>>,
    pub authed_lookups: RefCell<Vec<String>>,
    pub fail_listing: bool,
}

impl StubForge {
    pub fn new(repos: &[&str]) -> Self {
        Self {
            pages: vec![repos.iter().map(|s| s.to_string()).collect()],
            ..Default::default()
        }
    }

    pub fn head(mut self, org: &str, repo: &str, branch: &str, commit: &str) -> Self {
        self.heads
            .insert(format!("{org}/{repo}@{branch}"), commit.to_string());
        self
    }
}

impl Forge for StubForge {
    fn list_repos_page(
        &self,
        location: &RepoLocation,
        page: u32,
        _limit: u32,
    ) -> Result<Vec<RepoEntry>, ForgeError> {
        if self.fail_listing {
            return Err(ForgeError::Transport {
                url: location.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self
            .pages
            .get(page as usize - 1)
            .map(|names| {
                names
                    .iter()
                    .map(|n| RepoEntry { name: n.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn branch_head(
        &self,
        branch: &BranchRef,
        auth: Option<&AccessToken>,
    ) -> Result<CommitId, ForgeError> {
        let key = format!("{}/{}@{}", branch.repo.org, branch.repo.name, branch.branch);
        self.lookups.borrow_mut().push(key.clone());
        if auth.is_some() {
            self.authed_lookups.borrow_mut().push(key.clone());
        }
        self.heads
            .get(&key)
            .map(|c| CommitId::from(c.as_str()))
            .ok_or(ForgeError::Status {
                url: key,
                status: 404,
                body: "branch not found".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Recording runner
// ---------------------------------------------------------------------------

type Responder = Box<dyn Fn(&CommandSpec) -> CommandOutput>;

/// Records every command and answers through `responder` (success by default).
pub struct RecordingRunner {
    pub calls: RefCell<Vec<CommandSpec>>,
    /// Working directories seen, and whether each existed at call time.
    pub dirs: RefCell<Vec<(PathBuf, bool)>>,
    responder: Responder,
}

impl RecordingRunner {
    pub fn ok() -> Self {
        Self::with(|_| success(""))
    }

    pub fn with(responder: impl Fn(&CommandSpec) -> CommandOutput + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            dirs: RefCell::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Command lines as `program arg arg ...` (unredacted).
    pub fn lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|s| {
                let mut line = s.program.clone();
                for arg in &s.args {
                    line.push(' ');
                    line.push_str(arg);
                }
                line
            })
            .collect()
    }

    pub fn lines_starting(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with(prefix))
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        if let Some(cwd) = &spec.cwd {
            self.dirs.borrow_mut().push((cwd.clone(), cwd.is_dir()));
        }
        self.calls.borrow_mut().push(spec.clone());
        Ok((self.responder)(spec))
    }
}

pub fn success(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failure(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub const TOKEN: &str = "tok-1234";

pub fn token() -> AccessToken {
    AccessToken::new(TOKEN)
}

/// `saltbundle@bundle_testing` -> `saltbundle@bundle`, excluding `_ObsPrj`.
pub fn same_org_settings() -> BranchSettings {
    BranchSettings {
        source: RepoLocation::new("src.opensuse.org", "saltbundle"),
        source_branch: "bundle_testing".to_string(),
        target: RepoLocation::new("src.opensuse.org", "saltbundle"),
        target_branches: vec!["bundle".to_string()],
        exclude: vec!["_ObsPrj".to_string()],
        push_mode: PushMode::Plain,
        object_format: "sha256".to_string(),
        timeout: Duration::from_secs(30),
        token_env: "GITEA_TOKEN".to_string(),
    }
}

/// `saltbundle@bundle` -> `Galaxy@{mlmtools-main,mlmtools-stable}` on another server.
pub fn mirror_settings() -> BranchSettings {
    BranchSettings {
        source: RepoLocation::new("src.opensuse.org", "saltbundle"),
        source_branch: "bundle".to_string(),
        target: RepoLocation::new("src.suse.de", "Galaxy"),
        target_branches: vec!["mlmtools-main".to_string(), "mlmtools-stable".to_string()],
        exclude: vec!["_ObsPrj".to_string()],
        push_mode: PushMode::Plain,
        object_format: "sha256".to_string(),
        timeout: Duration::from_secs(30),
        token_env: "GITEA_TOKEN".to_string(),
    }
}
