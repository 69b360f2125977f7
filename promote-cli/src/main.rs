//! promote: move released work between branches, organizations, and
//! build-service projects.
//!
//! # Usage
//!
//! ```text
//! promote branches --source-branch <b> --target-branch <t>... [--target-server ..] [--target-org ..]
//!                  [--exclude <repo>]... [--force] [--show-diff] [--dry-run]
//! promote obs <packages|subprojects|projectconfigs|all> -s <project> -t <project> [-A <api>] [--dry-run]
//! promote prjconf --source-branch <b> --target-branch <t>... [--dry-run]
//! ```
//!
//! Every command ends with a summary; the exit code is 1 when any item failed.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{branches::BranchesArgs, obs::ObsArgs, prjconf::PrjconfArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "promote",
    version,
    about = "Promote branches and build-service packages between release stages",
    long_about = None,
)]
struct Cli {
    /// YAML configuration file (default: <config dir>/promote/config.yaml if present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Push a source branch to target branches for every repository of an organization.
    Branches(BranchesArgs),

    /// Copy differing packages and project configs between build-service projects.
    Obs(ObsArgs),

    /// Promote the project `_config` file between branches of `_ObsPrj`.
    Prjconf(PrjconfArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    let code = match cli.command {
        Commands::Branches(args) => args.run(config)?,
        Commands::Obs(args) => args.run(config)?,
        Commands::Prjconf(args) => args.run(config)?,
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(verbosity: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
