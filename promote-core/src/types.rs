//! Domain types shared by every promotion workflow.
//!
//! Everything here is transient: values are rebuilt from the hosting API on
//! every run and compared by value only.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Locations and references
// ---------------------------------------------------------------------------

/// A hosting server plus organization, e.g. `src.opensuse.org/saltbundle`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoLocation {
    pub server: String,
    pub org: String,
}

impl RepoLocation {
    pub fn new(server: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            org: org.into(),
        }
    }

    /// Reference a named repository inside this organization.
    pub fn repo(&self, name: impl Into<String>) -> RepoRef {
        RepoRef {
            server: self.server.clone(),
            org: self.org.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "https://{}/{}", self.server, self.org)
    }
}

/// A repository identified by (server, organization, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub server: String,
    pub org: String,
    pub name: String,
}

impl RepoRef {
    /// Anonymous clone URL.
    pub fn clone_url(&self) -> String {
        format!("https://{}/{}/{}", self.server, self.org, self.name)
    }

    /// Clone URL carrying `token` as the userinfo part, used for pushes.
    pub fn authenticated_url(&self, token: &AccessToken) -> String {
        format!(
            "https://{}@{}/{}/{}",
            token.expose(),
            self.server,
            self.org,
            self.name
        )
    }

    pub fn branch(&self, branch: impl Into<String>) -> BranchRef {
        BranchRef {
            repo: self.clone(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clone_url())
    }
}

/// A branch of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchRef {
    pub repo: RepoRef,
    pub branch: String,
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.repo, self.branch)
    }
}

/// Opaque commit identifier. Only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(pub String);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Push policy
// ---------------------------------------------------------------------------

/// How the local ref is pushed to each target branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushMode {
    /// Plain push; the remote rejects non-fast-forward updates.
    #[default]
    Plain,
    /// Overwrite the target branch regardless of its history.
    Force,
}

impl fmt::Display for PushMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushMode::Plain => write!(f, "plain"),
            PushMode::Force => write!(f, "force"),
        }
    }
}

// ---------------------------------------------------------------------------
// Access token
// ---------------------------------------------------------------------------

/// Bearer token for write-privileged hosting calls.
///
/// `Debug` and `Display` never print the secret; call [`AccessToken::expose`]
/// where the raw value is genuinely required.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
