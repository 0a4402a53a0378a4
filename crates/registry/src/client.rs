//! Registry client for validating, pulling, and pushing image content.
//!
//! Uses `oci-distribution` for registry transport. Credential resolution is
//! out of scope: the client reads a pre-issued ECR login password from the
//! environment and otherwise connects anonymously.

use async_trait::async_trait;
use oci_distribution::Reference;
use oci_distribution::client::{
    Client, ClientConfig, ClientProtocol, Config, ImageLayer, current_platform_resolver,
};
use oci_distribution::manifest::{
    IMAGE_DOCKER_LAYER_GZIP_MEDIA_TYPE, IMAGE_DOCKER_LAYER_TAR_MEDIA_TYPE,
    IMAGE_LAYER_GZIP_MEDIA_TYPE, IMAGE_LAYER_MEDIA_TYPE, IMAGE_MANIFEST_LIST_MEDIA_TYPE,
    IMAGE_MANIFEST_MEDIA_TYPE, OCI_IMAGE_INDEX_MEDIA_TYPE, OCI_IMAGE_MEDIA_TYPE,
    OciImageManifest, OciManifest,
};
use oci_distribution::secrets::RegistryAuth;
use tracing::{debug, info, warn};

use socidex_core::{ArtifactDescriptor, ImageReference, IndexVariant};

use crate::store::{LayoutDescriptor, OciStore, digest_bytes};
use crate::validate::{check_digest_syntax, validate_manifest_media_type};
use crate::{Error, Result, ValidationError};

/// Environment variable holding a pre-issued ECR login password.
pub const ECR_PASSWORD_ENV: &str = "ECR_LOGIN_PASSWORD";

const MANIFEST_MEDIA_TYPES: &[&str] = &[
    OCI_IMAGE_MEDIA_TYPE,
    IMAGE_MANIFEST_MEDIA_TYPE,
    OCI_IMAGE_INDEX_MEDIA_TYPE,
    IMAGE_MANIFEST_LIST_MEDIA_TYPE,
];

const LAYER_MEDIA_TYPES: &[&str] = &[
    IMAGE_LAYER_MEDIA_TYPE,
    IMAGE_LAYER_GZIP_MEDIA_TYPE,
    IMAGE_DOCKER_LAYER_TAR_MEDIA_TYPE,
    IMAGE_DOCKER_LAYER_GZIP_MEDIA_TYPE,
];

/// The registry operations the pipeline consumes.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Validate that the image exists and is well-formed for the variant.
    ///
    /// A failure here marks the input as permanently invalid; the pipeline
    /// skips the run instead of failing it.
    async fn validate_image(
        &self,
        image: &ImageReference,
        variant: IndexVariant,
    ) -> std::result::Result<(), ValidationError>;

    /// Pull the image into the local store.
    ///
    /// The manifest is recorded in the store's top-level index; callers
    /// address the image by its reference digest, so nothing is returned.
    async fn pull(&self, image: &ImageReference, store: &OciStore) -> Result<()>;

    /// Push a produced artifact from the store back to the image's repository.
    ///
    /// An empty `tag` pushes by digest only.
    async fn push(
        &self,
        store: &OciStore,
        artifact: &ArtifactDescriptor,
        image: &ImageReference,
        tag: &str,
    ) -> Result<()>;
}

/// `oci-distribution`-backed registry client for ECR endpoints.
pub struct EcrClient {
    client: Client,
    auth: RegistryAuth,
    region: String,
}

impl EcrClient {
    /// Initialize a client for a registry endpoint in a region.
    pub fn init(region: impl Into<String>) -> Self {
        Self {
            client: Client::new(Self::client_config()),
            auth: auth_from_env(),
            region: region.into(),
        }
    }

    /// Validation accepts multi-platform indexes for the legacy variant, so
    /// pull must be able to resolve an index to the host platform's
    /// manifest; without a resolver the transport rejects indexes outright.
    fn client_config() -> ClientConfig {
        ClientConfig {
            protocol: ClientProtocol::Https,
            platform_resolver: Some(Box::new(current_platform_resolver)),
            ..Default::default()
        }
    }

    /// The region this client was initialized for.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    fn reference_by_digest(image: &ImageReference) -> Reference {
        Reference::with_digest(
            image.registry().to_string(),
            image.repository().to_string(),
            image.digest().to_string(),
        )
    }
}

#[async_trait]
impl RegistryClient for EcrClient {
    async fn validate_image(
        &self,
        image: &ImageReference,
        variant: IndexVariant,
    ) -> std::result::Result<(), ValidationError> {
        check_digest_syntax(image.digest())?;

        let reference = Self::reference_by_digest(image);
        let (manifest, digest) = self
            .client
            .pull_manifest(&reference, &self.auth)
            .await
            .map_err(|e| ValidationError::manifest_fetch(image.canonical(), e.to_string()))?;

        let media_type = match &manifest {
            OciManifest::Image(m) => m
                .media_type
                .clone()
                .unwrap_or_else(|| OCI_IMAGE_MEDIA_TYPE.to_string()),
            OciManifest::ImageIndex(i) => i
                .media_type
                .clone()
                .unwrap_or_else(|| OCI_IMAGE_INDEX_MEDIA_TYPE.to_string()),
        };
        validate_manifest_media_type(&media_type, variant)?;

        debug!(image = %image.canonical(), %digest, %media_type, %variant, "Image validated");
        Ok(())
    }

    async fn pull(&self, image: &ImageReference, store: &OciStore) -> Result<()> {
        let reference = Self::reference_by_digest(image);

        let (manifest_bytes, _) = self
            .client
            .pull_manifest_raw(&reference, &self.auth, MANIFEST_MEDIA_TYPES)
            .await
            .map_err(|e| Error::pull_failed(image.canonical(), e.to_string()))?;

        // The registry addressed the manifest by the requested digest;
        // verify the bytes actually hash to it before trusting them.
        let manifest_digest = digest_bytes(&manifest_bytes);
        if manifest_digest != image.digest() {
            return Err(Error::digest_mismatch(image.digest(), manifest_digest));
        }

        let image_data = self
            .client
            .pull(&reference, &self.auth, LAYER_MEDIA_TYPES.to_vec())
            .await
            .map_err(|e| Error::pull_failed(image.canonical(), e.to_string()))?;

        let config_digest = digest_bytes(&image_data.config.data);
        store.put_blob(&config_digest, &image_data.config.data)?;
        for layer in &image_data.layers {
            let layer_digest = digest_bytes(&layer.data);
            store.put_blob(&layer_digest, &layer.data)?;
        }
        store.put_blob(&manifest_digest, &manifest_bytes)?;

        let media_type = serde_json::from_slice::<OciImageManifest>(&manifest_bytes)
            .ok()
            .and_then(|m| m.media_type)
            .unwrap_or_else(|| OCI_IMAGE_MEDIA_TYPE.to_string());

        let descriptor = LayoutDescriptor {
            media_type,
            digest: manifest_digest,
            size: manifest_bytes.len() as u64,
        };
        store.add_manifest(&descriptor)?;

        info!(
            image = %image.canonical(),
            layers = image_data.layers.len(),
            "Pulled image into local store"
        );

        Ok(())
    }

    async fn push(
        &self,
        store: &OciStore,
        artifact: &ArtifactDescriptor,
        image: &ImageReference,
        tag: &str,
    ) -> Result<()> {
        let manifest_bytes = store.get_blob(&artifact.digest)?;
        let manifest: OciImageManifest =
            serde_json::from_slice(&manifest_bytes).map_err(|e| Error::MalformedManifest {
                digest: artifact.digest.clone(),
                message: e.to_string(),
            })?;

        let config_data = store.get_blob(&manifest.config.digest)?;
        let config = Config::new(config_data, manifest.config.media_type.clone(), None);

        let mut layers = Vec::with_capacity(manifest.layers.len());
        for descriptor in &manifest.layers {
            let data = store.get_blob(&descriptor.digest)?;
            layers.push(ImageLayer::new(data, descriptor.media_type.clone(), None));
        }

        let reference = if tag.is_empty() {
            Reference::with_digest(
                image.registry().to_string(),
                image.repository().to_string(),
                artifact.digest.clone(),
            )
        } else {
            Reference::with_tag(
                image.registry().to_string(),
                image.repository().to_string(),
                tag.to_string(),
            )
        };

        self.client
            .push(&reference, &layers, config, &self.auth, Some(manifest))
            .await
            .map_err(|e| Error::push_failed(artifact.digest.clone(), e.to_string()))?;

        info!(digest = %artifact.digest, %reference, "Pushed artifact");
        Ok(())
    }
}

/// Build registry auth from the environment.
///
/// ECR login passwords are issued out-of-band (`aws ecr get-login-password`)
/// and always pair with the fixed `AWS` username.
fn auth_from_env() -> RegistryAuth {
    match std::env::var(ECR_PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => {
            RegistryAuth::Basic("AWS".to_string(), password)
        }
        _ => {
            warn!("No {ECR_PASSWORD_ENV} set; connecting anonymously");
            RegistryAuth::Anonymous
        }
    }
}
