//! Index-builder collaborator boundary for socidex.
//!
//! The SOCI index format and its construction algorithm live in an
//! external builder. This crate owns the interface to it:
//! - [`IndexBuilder`]: the two-variant build protocol (legacy build vs.
//!   direct convert)
//! - [`BuilderCommand`]: an implementation that shells out to the builder
//!   binary and derives produced descriptors from the store's index diff
//! - [`ArtifactCatalog`]: the `artifacts.db` side catalog of produced
//!   artifacts, consulted under the legacy variant
//! - [`BuiltIndex`]: the tagged union over the two result shapes, with the
//!   canonical-artifact selection policy

mod builder;
mod catalog;
mod error;
mod select;

pub use builder::{BuilderCommand, IndexBuilder, index_descriptor_collection};
pub use catalog::{ArtifactCatalog, CatalogEntry};
pub use error::{Error, Result};
pub use select::BuiltIndex;
