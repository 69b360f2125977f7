//! Gitea REST endpoints used by the promotion workflows.
//!
//! ```text
//! GET /api/v1/users/{org}/repos?limit={n}&page={p}   -> [{"name": ...}, ...]
//! GET /api/v1/repos/{org}/{repo}/branches/{branch}   -> {"commit": {"id": ...}}
//! ```

use std::time::Duration;

use serde::Deserialize;

use promote_core::{AccessToken, BranchRef, CommitId, RepoLocation};

use crate::error::ForgeError;

/// One element of the repository listing. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoEntry {
    pub name: String,
}

/// Hosting API operations. Implemented over HTTP by [`GiteaClient`] and by
/// in-memory stubs in tests.
pub trait Forge {
    /// Fetch one page (1-based) of the organization's repositories.
    fn list_repos_page(
        &self,
        location: &RepoLocation,
        page: u32,
        limit: u32,
    ) -> Result<Vec<RepoEntry>, ForgeError>;

    /// Current commit id of `branch`. `auth` adds a bearer token header.
    fn branch_head(
        &self,
        branch: &BranchRef,
        auth: Option<&AccessToken>,
    ) -> Result<CommitId, ForgeError>;
}

#[derive(Debug, Deserialize)]
struct BranchBody {
    commit: Option<CommitBody>,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    id: Option<String>,
}

/// Blocking HTTP client for Gitea.
#[derive(Debug, Clone)]
pub struct GiteaClient {
    agent: ureq::Agent,
    scheme: String,
}

impl GiteaClient {
    /// HTTPS client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self::with_scheme("https", timeout)
    }

    /// Client for a non-default scheme, e.g. `http` against a local stub.
    pub fn with_scheme(scheme: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("promote/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            scheme: scheme.into(),
        }
    }

    pub fn repos_url(&self, location: &RepoLocation, page: u32, limit: u32) -> String {
        format!(
            "{}://{}/api/v1/users/{}/repos?limit={limit}&page={page}",
            self.scheme, location.server, location.org
        )
    }

    pub fn branch_url(&self, branch: &BranchRef) -> String {
        let repo = &branch.repo;
        format!(
            "{}://{}/api/v1/repos/{}/{}/branches/{}",
            self.scheme, repo.server, repo.org, repo.name, branch.branch
        )
    }

    fn get(&self, url: &str, auth: Option<&AccessToken>) -> Result<ureq::Response, ForgeError> {
        tracing::debug!("GET {url}");
        let mut request = self.agent.get(url).set("Accept", "application/json");
        if let Some(token) = auth {
            request = request.set("Authorization", &token.bearer());
        }
        match request.call() {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => Err(ForgeError::Status {
                url: url.to_string(),
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(ForgeError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            }),
        }
    }
}

impl Forge for GiteaClient {
    fn list_repos_page(
        &self,
        location: &RepoLocation,
        page: u32,
        limit: u32,
    ) -> Result<Vec<RepoEntry>, ForgeError> {
        let url = self.repos_url(location, page, limit);
        self.get(&url, None)?
            .into_json::<Vec<RepoEntry>>()
            .map_err(|source| ForgeError::Decode { url, source })
    }

    fn branch_head(
        &self,
        branch: &BranchRef,
        auth: Option<&AccessToken>,
    ) -> Result<CommitId, ForgeError> {
        let url = self.branch_url(branch);
        let body = self
            .get(&url, auth)?
            .into_json::<BranchBody>()
            .map_err(|source| ForgeError::Decode {
                url: url.clone(),
                source,
            })?;
        body.commit
            .and_then(|c| c.id)
            .map(CommitId::from)
            .ok_or(ForgeError::MissingField {
                url,
                field: "commit.id",
            })
    }
}
