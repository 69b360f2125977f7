//! # promote-obs
//!
//! Build-service (Open Build Service) access through the `osc` client.
//!
//! [`BuildService`] is the seam package promotion depends on;
//! [`Osc`] implements it by running `osc` with explicit argument lists.
//! [`xml`] holds the small extractors applied to `osc api` responses.

pub mod error;
pub mod osc;
pub mod xml;

pub use error::ObsError;
pub use osc::{BuildService, Osc};
