//! `promote prjconf`: promote `_ObsPrj/_config` between branches.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use promote_core::{
    config::{token_from_env, BranchSettings},
    SystemRunner,
};
use promote_sync::ProjectConfigPromotion;

use super::{finish, load_config, LocationArgs};

/// Arguments for `promote prjconf`.
#[derive(Args, Debug)]
pub struct PrjconfArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Show the staged diff only; commit and push nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl PrjconfArgs {
    pub fn run(self, config: Option<&Path>) -> Result<i32> {
        let file = load_config(config)?;
        let settings = BranchSettings::resolve(&file, &self.location.overrides())
            .context("invalid project config settings")?;
        let token = token_from_env(&settings.token_env)?;

        let runner = SystemRunner;
        let promotion = ProjectConfigPromotion::new(&settings, &token, &runner, self.dry_run)?;

        let mut out = io::stdout().lock();
        let summary = promotion
            .run(&mut out)
            .context("could not promote the project config")?;
        finish(&summary, &mut out)
    }
}
