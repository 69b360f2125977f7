//! # promote-forge
//!
//! Read-only client for a Gitea-compatible hosting API.
//!
//! [`list_repositories`] pages through an organization's repositories and
//! drops excluded names; [`Forge::branch_head`] resolves a branch to its
//! current commit id. [`GiteaClient`] is the HTTP implementation of
//! [`Forge`].

pub mod client;
pub mod error;
pub mod lister;

pub use client::{Forge, GiteaClient, RepoEntry};
pub use error::ForgeError;
pub use lister::{list_repositories, MAX_PAGES, PAGE_SIZE};
