//! # promote-sync
//!
//! Promotion workflows built on the hosting client, the build-service
//! adapter and the subprocess runner.
//!
//! - [`branches::BranchPromotion`] relays a source branch to target branches
//!   for every repository of an organization.
//! - [`packages::PackagePromotion`] copies changed packages and project
//!   configurations between build-service projects.
//! - [`prjconf::ProjectConfigPromotion`] promotes the git-hosted `_config`.
//!
//! Every workflow writes a running log into the given `Write` and returns a
//! [`RunSummary`](promote_core::RunSummary).

pub mod branches;
pub mod error;
pub mod git;
pub mod packages;
pub mod prjconf;

pub use branches::{BranchPromotion, RunOptions};
pub use error::SyncError;
pub use git::{sync_branches, BranchSyncRequest};
pub use packages::{ObsAction, PackagePromotion};
pub use prjconf::ProjectConfigPromotion;
