//! The index-builder protocol boundary.
//!
//! Two variants, one transition per run:
//! - legacy `build` writes artifacts into the store and catalog, followed
//!   by [`index_descriptor_collection`] to enumerate candidates
//! - `convert` yields the produced descriptor directly
//!
//! [`BuilderCommand`] implements the boundary by invoking the external
//! SOCI builder binary against the local store and deriving produced
//! descriptors from the store's top-level index diff.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, info};

use socidex_core::{ArtifactDescriptor, ImageReference, Platform, current_platform};
use socidex_registry::OciStore;

use crate::catalog::{ArtifactCatalog, CatalogEntry};
use crate::{Error, Result};

/// The index-construction operations the pipeline consumes.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    /// Legacy (V1): build index artifacts into the store and catalog.
    ///
    /// The produced descriptors are not returned; callers enumerate them
    /// afterwards via [`index_descriptor_collection`].
    async fn build(
        &self,
        store: &OciStore,
        catalog: &ArtifactCatalog,
        image: &ImageReference,
    ) -> Result<()>;

    /// Convert (V2): one call that yields the produced descriptor.
    async fn convert(
        &self,
        store: &OciStore,
        catalog: &ArtifactCatalog,
        image: &ImageReference,
    ) -> Result<ArtifactDescriptor>;
}

/// Enumerate catalog candidates for an image on the given platforms.
///
/// Consulted only under the legacy variant. Each candidate's manifest blob
/// must still exist in the store; a dangling catalog entry means builder
/// and catalog disagree and the run cannot trust the enumeration.
pub fn index_descriptor_collection(
    store: &OciStore,
    catalog: &ArtifactCatalog,
    image: &ImageReference,
    platforms: &[Platform],
) -> Result<Vec<ArtifactDescriptor>> {
    let entries = catalog
        .entries_for_image(image.digest(), platforms)
        .map_err(|e| Error::EnumerationFailed(e.to_string()))?;

    let mut candidates = Vec::with_capacity(entries.len());
    for entry in entries {
        if !store.has_blob(&entry.artifact.digest) {
            return Err(Error::EnumerationFailed(format!(
                "catalog references {} but the blob is missing from the store",
                entry.artifact.digest
            )));
        }
        candidates.push(entry.artifact);
    }
    debug!(image = %image.canonical(), count = candidates.len(), "Enumerated index candidates");
    Ok(candidates)
}

/// External-process implementation of the builder boundary.
///
/// Invokes the SOCI builder binary with the local store root and a
/// minimum-layer-size threshold of zero, indexing every layer regardless
/// of size. Produced manifests are detected by diffing the store's
/// top-level index around the invocation and recorded into the catalog.
pub struct BuilderCommand {
    program: String,
    min_layer_size: u64,
}

impl Default for BuilderCommand {
    fn default() -> Self {
        Self::new("soci")
    }
}

impl BuilderCommand {
    /// Wrap the named builder program.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            min_layer_size: 0,
        }
    }

    /// Resolve the builder binary on PATH before invoking it.
    pub fn preflight(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| Error::BuilderNotFound(self.program.clone()))
    }

    async fn run(&self, subcommand: &str, store: &OciStore, image: &ImageReference) -> Result<()> {
        let binary = self.preflight()?;
        let output = Command::new(binary)
            .arg(subcommand)
            .arg(image.canonical())
            .arg("--min-layer-size")
            .arg(self.min_layer_size.to_string())
            .arg("--local-store")
            .arg(store.root())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = format!("{} {subcommand} exited with {}: {stderr}", self.program, output.status);
            return Err(match subcommand {
                "convert" => Error::ConvertFailed(message),
                _ => Error::BuildFailed(message),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IndexBuilder for BuilderCommand {
    async fn build(
        &self,
        store: &OciStore,
        catalog: &ArtifactCatalog,
        image: &ImageReference,
    ) -> Result<()> {
        info!(image = %image.canonical(), "Building SOCI index (legacy)");
        let before = manifest_digests(store)?;
        self.run("create", store, image).await?;
        let produced = record_new_manifests(store, catalog, &before, image)?;
        info!(count = produced.len(), "Builder recorded artifacts");
        Ok(())
    }

    async fn convert(
        &self,
        store: &OciStore,
        catalog: &ArtifactCatalog,
        image: &ImageReference,
    ) -> Result<ArtifactDescriptor> {
        info!(image = %image.canonical(), "Converting image to SOCI index");
        let before = manifest_digests(store)?;
        self.run("convert", store, image).await?;
        let mut produced = record_new_manifests(store, catalog, &before, image)?;
        if produced.len() != 1 {
            return Err(Error::AmbiguousConvert(produced.len()));
        }
        Ok(produced.remove(0))
    }
}

fn manifest_digests(store: &OciStore) -> Result<HashSet<String>> {
    Ok(store.manifests()?.into_iter().map(|d| d.digest).collect())
}

/// Record manifests that appeared in the store since `before` into the
/// catalog, stamped with the current time and the host platform.
pub(crate) fn record_new_manifests(
    store: &OciStore,
    catalog: &ArtifactCatalog,
    before: &HashSet<String>,
    image: &ImageReference,
) -> Result<Vec<ArtifactDescriptor>> {
    let platform = current_platform().to_string();
    let mut produced = Vec::new();

    for descriptor in store.manifests()? {
        if before.contains(&descriptor.digest) || descriptor.digest == image.digest() {
            continue;
        }
        let artifact = ArtifactDescriptor {
            digest: descriptor.digest,
            media_type: descriptor.media_type,
            size: descriptor.size,
            created_at: Utc::now(),
        };
        catalog.append(CatalogEntry {
            image_digest: image.digest().to_string(),
            platform: platform.clone(),
            artifact: artifact.clone(),
        })?;
        produced.push(artifact);
    }
    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use socidex_registry::{LayoutDescriptor, digest_bytes};
    use tempfile::TempDir;

    const DIGEST: &str = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn image() -> ImageReference {
        ImageReference::new("app", DIGEST, "us-east-1", "111122223333").unwrap()
    }

    fn add_artifact(store: &OciStore, data: &[u8]) -> String {
        let digest = digest_bytes(data);
        store.put_blob(&digest, data).unwrap();
        store
            .add_manifest(&LayoutDescriptor {
                media_type: "application/vnd.oci.image.manifest.v1+json".to_string(),
                digest: digest.clone(),
                size: data.len() as u64,
            })
            .unwrap();
        digest
    }

    #[test]
    fn test_preflight_missing_binary() {
        let builder = BuilderCommand::new("definitely-not-a-real-soci-binary");
        assert!(matches!(builder.preflight(), Err(Error::BuilderNotFound(_))));
    }

    #[test]
    fn test_record_new_manifests_diffs_the_index() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();
        let catalog = ArtifactCatalog::open(tmp.path().join("artifacts.db"));

        let pre_existing = add_artifact(&store, b"already there");
        let before = manifest_digests(&store).unwrap();

        let new_digest = add_artifact(&store, b"freshly built");
        let produced = record_new_manifests(&store, &catalog, &before, &image()).unwrap();

        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].digest, new_digest);
        assert!(produced.iter().all(|a| a.digest != pre_existing));

        let entries = catalog.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].image_digest, DIGEST);
    }

    #[test]
    fn test_record_skips_the_source_image_manifest() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();
        let catalog = ArtifactCatalog::open(tmp.path().join("artifacts.db"));

        // The pulled image itself is listed in the index; it must never be
        // recorded as a produced artifact.
        store
            .add_manifest(&LayoutDescriptor {
                media_type: "application/vnd.oci.image.manifest.v1+json".to_string(),
                digest: DIGEST.to_string(),
                size: 0,
            })
            .unwrap();
        let produced =
            record_new_manifests(&store, &catalog, &HashSet::new(), &image()).unwrap();
        assert!(produced.is_empty());
    }

    #[test]
    fn test_collection_returns_recorded_candidates() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();
        let catalog = ArtifactCatalog::open(tmp.path().join("artifacts.db"));

        add_artifact(&store, b"index one");
        let before = HashSet::new();
        record_new_manifests(&store, &catalog, &before, &image()).unwrap();

        let candidates =
            index_descriptor_collection(&store, &catalog, &image(), &[current_platform()]).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_collection_rejects_dangling_catalog_entries() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();
        let catalog = ArtifactCatalog::open(tmp.path().join("artifacts.db"));

        catalog
            .append(CatalogEntry {
                image_digest: DIGEST.to_string(),
                platform: current_platform().to_string(),
                artifact: ArtifactDescriptor::new("sha256:gone", "application/json", 1),
            })
            .unwrap();

        let err = index_descriptor_collection(&store, &catalog, &image(), &[current_platform()])
            .unwrap_err();
        assert!(matches!(err, Error::EnumerationFailed(_)));
    }

    #[test]
    fn test_collection_filters_by_platform() {
        let tmp = TempDir::new().unwrap();
        let store = OciStore::open(tmp.path().join("store")).unwrap();
        let catalog = ArtifactCatalog::open(tmp.path().join("artifacts.db"));

        let digest = add_artifact(&store, b"other platform");
        catalog
            .append(CatalogEntry {
                image_digest: DIGEST.to_string(),
                platform: "windows/amd64".to_string(),
                artifact: ArtifactDescriptor::new(digest, "application/json", 1),
            })
            .unwrap();

        let candidates =
            index_descriptor_collection(&store, &catalog, &image(), &[Platform::new("linux", "amd64")])
                .unwrap();
        assert!(candidates.is_empty());
    }
}
