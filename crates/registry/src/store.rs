//! Local OCI-layout content store.
//!
//! One store backs both the pulled image and the produced index artifacts,
//! rooted at `<workdir>/store/`:
//!
//! ```text
//! store/
//! ├── oci-layout         # {"imageLayoutVersion": "1.0.0"}
//! ├── index.json         # top-level manifest list
//! └── blobs/
//!     └── sha256/
//!         └── abc123...  # content-addressed blobs
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::{Error, Result};

const LAYOUT_MARKER: &str = "oci-layout";
const LAYOUT_VERSION: &str = "1.0.0";
const INDEX_FILE: &str = "index.json";

/// Compute the digest of a byte slice in OCI format (`sha256:<hex>`).
#[must_use]
pub fn digest_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{:x}", hasher.finalize())
}

/// A descriptor entry in the layout's top-level index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDescriptor {
    /// Media type of the referenced manifest.
    pub media_type: String,
    /// Content digest of the referenced manifest.
    pub digest: String,
    /// Size of the referenced manifest in bytes.
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutIndex {
    schema_version: u32,
    manifests: Vec<LayoutDescriptor>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutMarker {
    image_layout_version: String,
}

/// Content-addressed OCI-layout store rooted at a directory.
#[derive(Debug, Clone)]
pub struct OciStore {
    root: PathBuf,
}

impl OciStore {
    /// Open the store at `root`, creating the layout skeleton if missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { root: root.into() };
        store.ensure_layout()?;
        Ok(store)
    }

    /// The store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a blob by digest.
    #[must_use]
    pub fn blob_path(&self, digest: &str) -> PathBuf {
        let (algo, hash) = split_digest(digest);
        self.root.join("blobs").join(algo).join(hash)
    }

    /// Whether a blob is present.
    #[must_use]
    pub fn has_blob(&self, digest: &str) -> bool {
        self.blob_path(digest).exists()
    }

    /// Store a blob, verifying its content against the digest.
    ///
    /// Writes are atomic (tmp + rename) so a failed build cannot leave a
    /// half-written blob under its final name.
    pub fn put_blob(&self, digest: &str, data: &[u8]) -> Result<PathBuf> {
        if digest.starts_with("sha256:") {
            let actual = digest_bytes(data);
            if actual != digest {
                return Err(Error::digest_mismatch(digest, actual));
            }
        }

        let dest = self.blob_path(digest);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = dest.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &dest)?;
        trace!(digest, ?dest, "Stored blob");
        Ok(dest)
    }

    /// Read a blob back by digest.
    pub fn get_blob(&self, digest: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(digest);
        if !path.exists() {
            return Err(Error::BlobMissing(digest.to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Append a manifest descriptor to the top-level index.
    pub fn add_manifest(&self, descriptor: &LayoutDescriptor) -> Result<()> {
        let mut index = self.read_index()?;
        if index.manifests.iter().any(|d| d.digest == descriptor.digest) {
            return Ok(());
        }
        index.manifests.push(descriptor.clone());
        self.write_index(&index)?;
        debug!(digest = %descriptor.digest, "Added manifest to layout index");
        Ok(())
    }

    /// All manifest descriptors currently listed in the top-level index.
    pub fn manifests(&self) -> Result<Vec<LayoutDescriptor>> {
        Ok(self.read_index()?.manifests)
    }

    fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(self.root.join("blobs").join("sha256"))?;

        let marker = self.root.join(LAYOUT_MARKER);
        if !marker.exists() {
            let body = serde_json::to_vec(&LayoutMarker {
                image_layout_version: LAYOUT_VERSION.to_string(),
            })?;
            fs::write(marker, body)?;
        }

        if !self.root.join(INDEX_FILE).exists() {
            self.write_index(&LayoutIndex {
                schema_version: 2,
                manifests: Vec::new(),
            })?;
        }
        Ok(())
    }

    fn read_index(&self) -> Result<LayoutIndex> {
        let bytes = fs::read(self.root.join(INDEX_FILE))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_index(&self, index: &LayoutIndex) -> Result<()> {
        let path = self.root.join(INDEX_FILE);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(index)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Split a digest into (algorithm, hash), defaulting to sha256.
fn split_digest(digest: &str) -> (&str, &str) {
    digest.split_once(':').unwrap_or(("sha256", digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_digest_bytes_empty() {
        assert_eq!(
            digest_bytes(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_open_creates_layout() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();
        assert!(store.root().join("oci-layout").exists());
        assert!(store.root().join("index.json").exists());
        assert!(store.root().join("blobs").join("sha256").exists());
        assert!(store.manifests().unwrap().is_empty());
    }

    #[test]
    fn test_blob_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();

        let data = b"hello";
        let digest = digest_bytes(data);
        store.put_blob(&digest, data).unwrap();

        assert!(store.has_blob(&digest));
        assert_eq!(store.get_blob(&digest).unwrap(), data);
    }

    #[test]
    fn test_put_blob_rejects_corrupt_content() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();

        let digest = digest_bytes(b"expected");
        let err = store.put_blob(&digest, b"tampered").unwrap_err();
        assert!(matches!(err, Error::DigestMismatch { .. }));
        assert!(!store.has_blob(&digest));
    }

    #[test]
    fn test_get_missing_blob() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();
        let err = store.get_blob("sha256:feedbeef").unwrap_err();
        assert!(matches!(err, Error::BlobMissing(_)));
    }

    #[test]
    fn test_add_manifest_deduplicates() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();

        let desc = LayoutDescriptor {
            media_type: "application/vnd.oci.image.manifest.v1+json".to_string(),
            digest: "sha256:abc".to_string(),
            size: 3,
        };
        store.add_manifest(&desc).unwrap();
        store.add_manifest(&desc).unwrap();
        assert_eq!(store.manifests().unwrap(), vec![desc]);
    }

    #[test]
    fn test_index_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        let desc = LayoutDescriptor {
            media_type: "application/vnd.oci.image.manifest.v1+json".to_string(),
            digest: "sha256:def".to_string(),
            size: 9,
        };
        OciStore::open(&root).unwrap().add_manifest(&desc).unwrap();

        let reopened = OciStore::open(&root).unwrap();
        assert_eq!(reopened.manifests().unwrap(), vec![desc]);
    }
}
