//! Layered configuration.
//!
//! Every setting resolves as: command-line flag, then config file, then the
//! built-in default. The config file is YAML:
//!
//! ```yaml
//! timeout_secs: 600
//! token_env: GITEA_TOKEN
//! branches:
//!   source_server: src.opensuse.org
//!   source_org: saltbundle
//!   source_branch: bundle
//!   target_server: src.suse.de
//!   target_org: Galaxy
//!   target_branches: [mlmtools-main, mlmtools-stable]
//!   exclude: [_ObsPrj]
//!   push: plain
//! obs:
//!   api_url: https://api.opensuse.org
//!   source: systemsmanagement:saltstack:bundle:testing
//!   target: systemsmanagement:saltstack:bundle
//!   exclude_packages: []
//!   exclude_subprojects: []
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{io_err, ConfigError};
use crate::types::{AccessToken, PushMode, RepoLocation};

pub const DEFAULT_SERVER: &str = "src.opensuse.org";
pub const DEFAULT_ORG: &str = "saltbundle";
pub const DEFAULT_EXCLUDE: &[&str] = &["_ObsPrj"];
pub const DEFAULT_OBS_API: &str = "https://api.opensuse.org";
pub const DEFAULT_OBJECT_FORMAT: &str = "sha256";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_TOKEN_ENV: &str = "GITEA_TOKEN";

/// Value shipped in old configurations in place of a real token.
pub const TOKEN_PLACEHOLDER: &str = "PUT-YOUR-ACCESS-TOKEN-HERE";

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub timeout_secs: Option<u64>,
    pub token_env: Option<String>,
    pub branches: BranchSection,
    pub obs: ObsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BranchSection {
    pub source_server: Option<String>,
    pub source_org: Option<String>,
    pub source_branch: Option<String>,
    pub target_server: Option<String>,
    pub target_org: Option<String>,
    pub target_branches: Vec<String>,
    pub exclude: Option<Vec<String>>,
    pub push: Option<PushMode>,
    pub object_format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObsSection {
    pub api_url: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub exclude_packages: Vec<String>,
    pub exclude_subprojects: Vec<String>,
}

impl FileConfig {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given (it must exist), otherwise the default
    /// location if present, otherwise an empty config.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_path() {
            Some(path) if path.exists() => {
                tracing::debug!("using config file {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Per-call budget; zero would kill every command and request at once.
    fn timeout(&self, flag: Option<u64>) -> Result<Duration, ConfigError> {
        match flag.or(self.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS) {
            0 => Err(ConfigError::Invalid(
                "timeout_secs must be at least 1".to_string(),
            )),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}

/// `<config_dir>/promote/config.yaml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("promote").join("config.yaml"))
}

// ---------------------------------------------------------------------------
// Access token
// ---------------------------------------------------------------------------

/// Read and validate the access token from environment variable `var`.
pub fn token_from_env(var: &str) -> Result<AccessToken, ConfigError> {
    validate_token(var, std::env::var(var).ok())
}

/// Validate a token value read from `var`.
pub fn validate_token(var: &str, value: Option<String>) -> Result<AccessToken, ConfigError> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Err(ConfigError::MissingToken {
            var: var.to_string(),
        });
    }
    if value == TOKEN_PLACEHOLDER {
        return Err(ConfigError::PlaceholderToken {
            var: var.to_string(),
        });
    }
    Ok(AccessToken::new(value))
}

// ---------------------------------------------------------------------------
// Branch promotion settings
// ---------------------------------------------------------------------------

/// Command-line values for branch promotion. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct BranchOverrides {
    pub source_server: Option<String>,
    pub source_org: Option<String>,
    pub source_branch: Option<String>,
    pub target_server: Option<String>,
    pub target_org: Option<String>,
    pub target_branches: Vec<String>,
    pub exclude: Vec<String>,
    pub force: bool,
    pub token_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for branch promotion, minus the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSettings {
    pub source: RepoLocation,
    pub source_branch: String,
    pub target: RepoLocation,
    pub target_branches: Vec<String>,
    pub exclude: Vec<String>,
    pub push_mode: PushMode,
    pub object_format: String,
    pub timeout: Duration,
    pub token_env: String,
}

impl BranchSettings {
    pub fn resolve(file: &FileConfig, flags: &BranchOverrides) -> Result<Self, ConfigError> {
        let section = &file.branches;

        let source_server = pick(&flags.source_server, &section.source_server)
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let source_org = pick(&flags.source_org, &section.source_org)
            .unwrap_or_else(|| DEFAULT_ORG.to_string());
        let source_branch = pick(&flags.source_branch, &section.source_branch)
            .ok_or(ConfigError::Missing("source branch"))?;

        // The target defaults to the source location: same-org promotion.
        let target_server =
            pick(&flags.target_server, &section.target_server).unwrap_or_else(|| source_server.clone());
        let target_org =
            pick(&flags.target_org, &section.target_org).unwrap_or_else(|| source_org.clone());

        let target_branches = if flags.target_branches.is_empty() {
            section.target_branches.clone()
        } else {
            flags.target_branches.clone()
        };
        if target_branches.is_empty() {
            return Err(ConfigError::Missing("target branch"));
        }

        let source = RepoLocation::new(source_server, source_org);
        let target = RepoLocation::new(target_server, target_org);
        if source == target && target_branches.contains(&source_branch) {
            return Err(ConfigError::Invalid(format!(
                "branch '{source_branch}' cannot be both source and target in {source}"
            )));
        }

        // Flags add to the file (or default) list rather than replacing it.
        let mut exclude = section
            .exclude
            .clone()
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect());
        for name in &flags.exclude {
            if !exclude.contains(name) {
                exclude.push(name.clone());
            }
        }

        let push_mode = if flags.force {
            PushMode::Force
        } else {
            section.push.unwrap_or_default()
        };

        Ok(Self {
            source,
            source_branch,
            target,
            target_branches,
            exclude,
            push_mode,
            object_format: section
                .object_format
                .clone()
                .unwrap_or_else(|| DEFAULT_OBJECT_FORMAT.to_string()),
            timeout: file.timeout(flags.timeout_secs)?,
            token_env: pick(&flags.token_env, &file.token_env)
                .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Build-service promotion settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ObsOverrides {
    pub api_url: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub exclude_packages: Vec<String>,
    pub exclude_subprojects: Vec<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsSettings {
    pub api_url: String,
    pub source: String,
    pub target: String,
    pub exclude_packages: Vec<String>,
    pub exclude_subprojects: Vec<String>,
    pub timeout: Duration,
}

impl ObsSettings {
    pub fn resolve(file: &FileConfig, flags: &ObsOverrides) -> Result<Self, ConfigError> {
        let section = &file.obs;
        let source =
            pick(&flags.source, &section.source).ok_or(ConfigError::Missing("source project"))?;
        let target =
            pick(&flags.target, &section.target).ok_or(ConfigError::Missing("target project"))?;
        if source == target {
            return Err(ConfigError::Invalid(format!(
                "source and target project are both '{source}'"
            )));
        }

        Ok(Self {
            api_url: pick(&flags.api_url, &section.api_url)
                .unwrap_or_else(|| DEFAULT_OBS_API.to_string()),
            source,
            target,
            exclude_packages: merge(&flags.exclude_packages, &section.exclude_packages),
            exclude_subprojects: merge(&flags.exclude_subprojects, &section.exclude_subprojects),
            timeout: file.timeout(flags.timeout_secs)?,
        })
    }
}

fn pick(flag: &Option<String>, file: &Option<String>) -> Option<String> {
    flag.clone()
        .or_else(|| file.clone())
        .filter(|v| !v.trim().is_empty())
}

fn merge(flags: &[String], file: &[String]) -> Vec<String> {
    if flags.is_empty() {
        file.to_vec()
    } else {
        flags.to_vec()
    }
}
