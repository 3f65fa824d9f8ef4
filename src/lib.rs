#![doc = "blender-publish: core logic for publishing a Blender extension package to a distribution service."]

//! This crate holds everything that does not depend on a concrete HTTP stack:
//! invocation parameters, manifest handling, the [`contract::Distribution`] seam
//! and the two-step publish pipeline built on it.
//!
//! The networked client and the command line live in `blender-publish-cli`.

pub mod config;
pub mod contract;
pub mod error;
pub mod manifest;
pub mod publish;

pub use config::PublishConfig;
pub use contract::{Distribution, DistributionError, PackageId, UploadedPackage};
pub use error::PublishError;
pub use publish::{publish, PublishReport};
