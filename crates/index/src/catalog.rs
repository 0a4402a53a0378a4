//! The side catalog of produced SOCI artifacts (`artifacts.db`).
//!
//! A single JSON file next to the content store, appended after each
//! build and consulted under the legacy variant to resolve the most
//! recently produced index for an image.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use socidex_core::{ArtifactDescriptor, Platform};

use crate::{Error, Result};

/// One produced artifact, keyed by the image it indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Digest of the source image the artifact was built for.
    pub image_digest: String,
    /// Platform the artifact applies to (`os/arch`).
    pub platform: String,
    /// The produced artifact.
    pub artifact: ArtifactDescriptor,
}

/// Append-only catalog of produced artifacts backed by one JSON file.
#[derive(Debug, Clone)]
pub struct ArtifactCatalog {
    path: PathBuf,
}

impl ArtifactCatalog {
    /// Open a catalog at the given file path. The file is created lazily
    /// on first append; a missing file reads as empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The catalog file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries currently recorded.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::catalog(format!("failed to parse {}: {e}", self.path.display())))
    }

    /// Entries for an image digest on a set of platforms.
    pub fn entries_for_image(
        &self,
        image_digest: &str,
        platforms: &[Platform],
    ) -> Result<Vec<CatalogEntry>> {
        let wanted: Vec<String> = platforms.iter().map(ToString::to_string).collect();
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.image_digest == image_digest && wanted.contains(&e.platform))
            .collect())
    }

    /// Record a produced artifact. The write is atomic (tmp + rename) so a
    /// crashed build cannot corrupt the catalog for later enumeration.
    pub fn append(&self, entry: CatalogEntry) -> Result<()> {
        let mut entries = self.entries()?;
        entries.push(entry);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("db.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
