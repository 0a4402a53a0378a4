//! Registry collaborator boundary for socidex.
//!
//! This crate owns everything that talks to the remote registry:
//! - [`RegistryClient`]: the pull/push/validate interface the pipeline
//!   consumes
//! - [`EcrClient`]: the `oci-distribution`-backed implementation
//! - [`OciStore`]: the local OCI-layout content store rooted under the
//!   run's working directory
//!
//! Validation failures carry their own [`ValidationError`] type so callers
//! can distinguish "skip, do not retry" from terminal infrastructure
//! failures without inspecting messages.

mod client;
mod error;
mod store;
mod validate;

pub use client::{EcrClient, RegistryClient};
pub use error::{Error, Result, ValidationError};
pub use store::{LayoutDescriptor, OciStore, digest_bytes};
pub use validate::validate_manifest_media_type;
