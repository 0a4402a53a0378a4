//! Shared types for the socidex pipeline.
//!
//! This crate holds the leaf data model used across the workspace:
//! - Image references with derived ECR registry endpoints
//! - The SOCI index variant (legacy build vs. convert)
//! - Descriptors for produced index artifacts
//! - Platform detection for candidate enumeration
//! - The structured log-context value threaded through the pipeline

mod artifact;
mod context;
mod error;
mod platform;
mod reference;
mod variant;

pub use artifact::ArtifactDescriptor;
pub use context::RunContext;
pub use error::{Error, Result};
pub use platform::{Platform, current_platform};
pub use reference::{ImageReference, ecr_registry_url};
pub use variant::IndexVariant;
