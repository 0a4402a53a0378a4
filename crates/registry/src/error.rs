//! Error types for registry operations.
//!
//! Two distinct classes: [`ValidationError`] marks a permanently invalid
//! input (the pipeline skips the run and reports success so batch callers
//! do not retry); [`Error`] marks terminal infrastructure failures.

use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pre-flight validation failures.
///
/// These never abort the batch caller: the pipeline converts them into a
/// skip outcome. Anything that goes wrong while validating lands here,
/// including transport errors during the validation fetch.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The digest string is not `sha256:` followed by 64 hex characters.
    #[error("Malformed image digest '{0}'")]
    MalformedDigest(String),

    /// The manifest could not be fetched for the given reference.
    #[error("Manifest fetch failed for '{image}': {message}")]
    ManifestFetch {
        /// Canonical image name.
        image: String,
        /// Error message from the registry.
        message: String,
    },

    /// The manifest media type is not supported by any variant.
    #[error("Unsupported manifest media type '{0}'")]
    UnsupportedMediaType(String),

    /// Multi-platform indexes cannot be converted (V2).
    #[error("Media type '{0}' is not convertible; V2 requires a single-platform image manifest")]
    NotConvertible(String),
}

/// Terminal registry failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Client initialization failed.
    #[error("Registry client initialization failed: {0}")]
    Init(String),

    /// Pulling image content failed.
    #[error("Failed to pull '{image}': {message}")]
    PullFailed {
        /// Canonical image name.
        image: String,
        /// Error message.
        message: String,
    },

    /// Pushing the produced artifact failed.
    #[error("Failed to push artifact {digest}: {message}")]
    PushFailed {
        /// The artifact digest.
        digest: String,
        /// Error message.
        message: String,
    },

    /// A blob referenced by a manifest is missing from the local store.
    #[error("Blob {0} not found in local store")]
    BlobMissing(String),

    /// Downloaded content did not match its expected digest.
    #[error("Digest mismatch for blob: expected {expected}, got {actual}")]
    DigestMismatch {
        /// The expected digest.
        expected: String,
        /// The computed digest.
        actual: String,
    },

    /// The stored artifact manifest could not be parsed for push.
    #[error("Malformed artifact manifest {digest}: {message}")]
    MalformedManifest {
        /// The artifact digest.
        digest: String,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a pull failure for an image.
    #[must_use]
    pub fn pull_failed(image: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PullFailed {
            image: image.into(),
            message: message.into(),
        }
    }

    /// Create a push failure for an artifact.
    #[must_use]
    pub fn push_failed(digest: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PushFailed {
            digest: digest.into(),
            message: message.into(),
        }
    }

    /// Create a digest mismatch error.
    #[must_use]
    pub fn digest_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::DigestMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl ValidationError {
    /// Create a manifest fetch failure.
    #[must_use]
    pub fn manifest_fetch(image: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ManifestFetch {
            image: image.into(),
            message: message.into(),
        }
    }
}
