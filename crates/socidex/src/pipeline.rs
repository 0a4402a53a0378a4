//! The build-and-publish pipeline.
//!
//! One run is a fixed sequence over two collaborators: the registry
//! client and the index builder. Validation failures are terminal for the
//! input but not for the run; they produce a skip outcome so batch
//! callers treat the image as done rather than retrying it.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, warn};

use socidex_core::{
    ArtifactDescriptor, ImageReference, IndexVariant, RunContext, current_platform,
};
use socidex_index::{ArtifactCatalog, BuiltIndex, IndexBuilder, index_descriptor_collection};
use socidex_registry::{OciStore, RegistryClient};

use crate::workdir::WorkDir;

/// Inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    /// ECR repository name.
    pub repository: String,
    /// Content digest of the image to index.
    pub digest: String,
    /// AWS region of the registry.
    pub region: String,
    /// AWS account owning the registry.
    pub account: String,
    /// Which index-construction protocol to use.
    pub variant: IndexVariant,
    /// Base tag the produced index is published under (convert only).
    pub base_tag: Option<String>,
}

/// How a run ended, short of a terminal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The index was built and pushed.
    Completed {
        /// Digest of the pushed index artifact.
        digest: String,
        /// Tag it was pushed under, if any.
        tag: Option<String>,
    },
    /// The input failed validation and the run was skipped.
    Skipped {
        /// Why the image was skipped.
        reason: String,
    },
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed {
                digest,
                tag: Some(tag),
            } => write!(f, "Pushed SOCI index {digest} tagged {tag}"),
            Self::Completed { digest, tag: None } => {
                write!(f, "Pushed SOCI index {digest} by digest")
            }
            Self::Skipped { reason } => write!(f, "Skipped image: {reason}"),
        }
    }
}

/// Terminal pipeline failures. Unlike validation failures these are worth
/// retrying and surface as a nonzero exit.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The image reference could not be constructed.
    #[error("Invalid image reference: {0}")]
    Reference(#[from] socidex_core::Error),

    /// Working-directory setup failed.
    #[error("Workspace setup failed: {0}")]
    Workspace(#[from] std::io::Error),

    /// Pull or push failed.
    #[error(transparent)]
    Registry(#[from] socidex_registry::Error),

    /// Index construction, enumeration, or selection failed.
    #[error(transparent)]
    Index(#[from] socidex_index::Error),
}

/// The pipeline, generic over its two collaborators.
pub struct Pipeline<R, B> {
    registry: R,
    builder: B,
    workspace_root: PathBuf,
}

impl<R: RegistryClient, B: IndexBuilder> Pipeline<R, B> {
    /// Assemble a pipeline whose working directories live under
    /// `workspace_root`.
    pub fn new(registry: R, builder: B, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            builder,
            workspace_root: workspace_root.into(),
        }
    }

    /// Run the pipeline for one image.
    pub async fn run(&self, request: &ProcessRequest) -> Result<Outcome, PipelineError> {
        let image = ImageReference::new(
            &request.repository,
            &request.digest,
            &request.region,
            &request.account,
        )?;
        let ctx = RunContext::new(&image);

        if let Err(reason) = self.registry.validate_image(&image, request.variant).await {
            warn!(
                registry_url = %ctx.registry_url(),
                image = %ctx.image(),
                %reason,
                "Image failed validation, skipping"
            );
            return Ok(Outcome::Skipped {
                reason: reason.to_string(),
            });
        }

        let mut workdir = WorkDir::acquire(&self.workspace_root)?;
        let store = OciStore::open(workdir.store_path())?;
        let catalog = ArtifactCatalog::open(workdir.catalog_path());

        let result = self.execute(&image, &ctx, request, &store, &catalog).await;
        workdir.release();

        if let Err(e) = &result {
            error!(
                registry_url = %ctx.registry_url(),
                image = %ctx.image(),
                error = %e,
                "Pipeline run failed"
            );
        }
        result
    }

    async fn execute(
        &self,
        image: &ImageReference,
        ctx: &RunContext,
        request: &ProcessRequest,
        store: &OciStore,
        catalog: &ArtifactCatalog,
    ) -> Result<Outcome, PipelineError> {
        info!(
            registry_url = %ctx.registry_url(),
            image = %ctx.image(),
            variant = %request.variant,
            "Pulling image"
        );
        self.registry.pull(image, store).await?;

        let built = self.build(request.variant, store, catalog, image).await?;
        let artifact = built.resolve()?;

        let ctx = ctx.with_index_digest(&artifact.digest);
        info!(
            registry_url = %ctx.registry_url(),
            image = %ctx.image(),
            index_digest = ctx.index_digest().unwrap_or_default(),
            "Built SOCI index"
        );

        let tag = request.variant.output_tag(request.base_tag.as_deref());
        self.registry.push(store, &artifact, image, &tag).await?;
        info!(
            registry_url = %ctx.registry_url(),
            image = %ctx.image(),
            index_digest = ctx.index_digest().unwrap_or_default(),
            tag = %tag,
            "Pushed SOCI index"
        );

        Ok(Outcome::Completed {
            digest: artifact.digest,
            tag: (!tag.is_empty()).then_some(tag),
        })
    }

    async fn build(
        &self,
        variant: IndexVariant,
        store: &OciStore,
        catalog: &ArtifactCatalog,
        image: &ImageReference,
    ) -> Result<BuiltIndex, PipelineError> {
        match variant {
            IndexVariant::Legacy => {
                self.builder.build(store, catalog, image).await?;
                let candidates =
                    index_descriptor_collection(store, catalog, image, &[current_platform()])?;
                Ok(BuiltIndex::Candidates(candidates))
            }
            IndexVariant::Convert => {
                let artifact: ArtifactDescriptor =
                    self.builder.convert(store, catalog, image).await?;
                Ok(BuiltIndex::Converted(artifact))
            }
        }
    }
}
