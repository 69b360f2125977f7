//! `promote obs`: package and project-config promotion on the build service.

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;
use promote_core::{
    config::{ObsOverrides, ObsSettings},
    SystemRunner,
};
use promote_obs::Osc;
use promote_sync::{ObsAction, PackagePromotion};

use super::{finish, load_config};

/// Arguments for `promote obs`.
#[derive(Args, Debug)]
pub struct ObsArgs {
    /// What to promote: packages, subprojects, projectconfigs, or all.
    pub action: ObsActionArg,

    /// Source project.
    #[arg(short, long, value_name = "PROJECT")]
    pub source: Option<String>,

    /// Destination project.
    #[arg(short, long, value_name = "PROJECT")]
    pub target: Option<String>,

    /// Build-service API URL.
    #[arg(short = 'A', long = "apiurl", value_name = "URL")]
    pub api_url: Option<String>,

    /// Package to skip; repeat for several.
    #[arg(long = "exclude", value_name = "PACKAGE")]
    pub exclude_packages: Vec<String>,

    /// Subproject to skip, by full name or suffix; repeat for several.
    #[arg(long = "exclude-subproject", value_name = "PROJECT")]
    pub exclude_subprojects: Vec<String>,

    /// Show diffs only; copy and write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Timeout for each `osc` call, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

impl ObsArgs {
    pub fn run(self, config: Option<&Path>) -> Result<i32> {
        let file = load_config(config)?;
        let overrides = ObsOverrides {
            api_url: self.api_url,
            source: self.source,
            target: self.target,
            exclude_packages: self.exclude_packages,
            exclude_subprojects: self.exclude_subprojects,
            timeout_secs: self.timeout_secs,
        };
        let settings =
            ObsSettings::resolve(&file, &overrides).context("invalid build-service settings")?;

        let osc = Osc::new(&SystemRunner, settings.api_url.clone(), settings.timeout);
        let promotion = PackagePromotion {
            settings: &settings,
            service: &osc,
            dry_run: self.dry_run,
        };

        let mut out = io::stdout().lock();
        let summary = promotion
            .run(self.action.0, &mut out)
            .with_context(|| format!("could not promote {} to {}", settings.source, settings.target))?;
        finish(&summary, &mut out)
    }
}

// ---------------------------------------------------------------------------
// Action argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse [`ObsAction`] from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct ObsActionArg(pub ObsAction);

impl FromStr for ObsActionArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "packages" => Ok(Self(ObsAction::Packages)),
            "subprojects" => Ok(Self(ObsAction::Subprojects)),
            "projectconfigs" => Ok(Self(ObsAction::ProjectConfigs)),
            "all" => Ok(Self(ObsAction::All)),
            other => Err(format!(
                "unknown action '{other}'; expected: packages, subprojects, projectconfigs, all"
            )),
        }
    }
}

impl fmt::Display for ObsActionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            ObsAction::Packages => "packages",
            ObsAction::Subprojects => "subprojects",
            ObsAction::ProjectConfigs => "projectconfigs",
            ObsAction::All => "all",
        };
        f.write_str(name)
    }
}
