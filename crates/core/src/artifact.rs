//! Descriptors for produced SOCI index artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A SOCI index artifact produced into the local artifact store.
///
/// Zero, one, or many descriptors may exist per run under the legacy
/// variant; exactly one under convert. The creation timestamp drives the
/// canonical-artifact selection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Content digest of the artifact manifest (`sha256:<hex>`).
    pub digest: String,
    /// Media type of the artifact manifest.
    pub media_type: String,
    /// Size of the artifact manifest in bytes.
    pub size: u64,
    /// When the builder produced the artifact.
    pub created_at: DateTime<Utc>,
}

impl ArtifactDescriptor {
    /// Create a descriptor stamped with the current time.
    #[must_use]
    pub fn new(digest: impl Into<String>, media_type: impl Into<String>, size: u64) -> Self {
        Self {
            digest: digest.into(),
            media_type: media_type.into(),
            size,
            created_at: Utc::now(),
        }
    }
}
