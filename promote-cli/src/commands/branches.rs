//! `promote branches`: relay a source branch across an organization.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use promote_core::{
    config::{token_from_env, BranchSettings},
    SystemRunner,
};
use promote_forge::GiteaClient;
use promote_sync::{BranchPromotion, RunOptions};

use super::{finish, load_config, LocationArgs};

/// Arguments for `promote branches`.
#[derive(Args, Debug)]
pub struct BranchesArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Repository to skip in addition to the configured list (`_ObsPrj` by default); repeat for several.
    #[arg(long, value_name = "REPO")]
    pub exclude: Vec<String>,

    /// Force-push to the target branches.
    #[arg(long)]
    pub force: bool,

    /// Print `git diff --stat` against each target branch before pushing.
    #[arg(long)]
    pub show_diff: bool,

    /// Compare heads and report only; no git process is started.
    #[arg(long)]
    pub dry_run: bool,
}

impl BranchesArgs {
    pub fn run(self, config: Option<&Path>) -> Result<i32> {
        let file = load_config(config)?;
        let mut overrides = self.location.overrides();
        overrides.exclude = self.exclude;
        overrides.force = self.force;
        let settings =
            BranchSettings::resolve(&file, &overrides).context("invalid branch promotion settings")?;
        let token = token_from_env(&settings.token_env)?;

        tracing::info!(
            "promoting {}@{} -> {}@{:?}",
            settings.source,
            settings.source_branch,
            settings.target,
            settings.target_branches
        );

        let forge = GiteaClient::new(settings.timeout);
        let promotion = BranchPromotion {
            settings: &settings,
            token: &token,
            forge: &forge,
            runner: &SystemRunner,
            options: RunOptions {
                dry_run: self.dry_run,
                show_diff: self.show_diff,
            },
        };

        let mut out = io::stdout().lock();
        let summary = promotion
            .run(&mut out)
            .with_context(|| format!("could not promote branches of {}", settings.source))?;
        finish(&summary, &mut out)
    }
}
