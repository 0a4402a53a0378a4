//! Error types for index-builder operations.

use thiserror::Error;

/// Result type for index-builder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the builder boundary, tagged by protocol step.
#[derive(Error, Debug)]
pub enum Error {
    /// The builder binary is not installed or not on PATH.
    #[error("SOCI builder '{0}' not found on PATH")]
    BuilderNotFound(String),

    /// The legacy build step failed.
    #[error("SOCI index build failed: {0}")]
    BuildFailed(String),

    /// The convert step failed.
    #[error("SOCI index conversion failed: {0}")]
    ConvertFailed(String),

    /// Post-build candidate enumeration failed.
    #[error("Index descriptor enumeration failed: {0}")]
    EnumerationFailed(String),

    /// The build step reported success but the catalog holds no artifacts.
    ///
    /// This is an internal inconsistency between builder and catalog, not
    /// a user input error; it is always terminal.
    #[error("Builder reported success but produced no index artifacts")]
    NoArtifacts,

    /// The convert step must yield exactly one artifact.
    #[error("Convert produced {0} artifacts, expected exactly one")]
    AmbiguousConvert(usize),

    /// Catalog read/write failed.
    #[error("Artifact catalog error: {0}")]
    Catalog(String),

    /// Local store error.
    #[error(transparent)]
    Store(#[from] socidex_registry::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a catalog error.
    #[must_use]
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }
}
