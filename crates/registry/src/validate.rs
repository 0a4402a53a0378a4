//! Manifest well-formedness checks per index variant.

use oci_distribution::manifest::{
    IMAGE_MANIFEST_LIST_MEDIA_TYPE, IMAGE_MANIFEST_MEDIA_TYPE, OCI_IMAGE_INDEX_MEDIA_TYPE,
    OCI_IMAGE_MEDIA_TYPE,
};
use socidex_core::IndexVariant;

use crate::ValidationError;

/// Check that a digest string is `sha256:` followed by 64 hex characters.
pub(crate) fn check_digest_syntax(digest: &str) -> Result<(), ValidationError> {
    let malformed = || ValidationError::MalformedDigest(digest.to_string());
    let hex = digest.strip_prefix("sha256:").ok_or_else(malformed)?;
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    Ok(())
}

/// Check that a manifest media type is acceptable for the requested variant.
///
/// Legacy indexing accepts single-platform image manifests and multi-platform
/// indexes (Docker v2 or OCI). Convert only supports single-platform image
/// manifests; indexes are rejected as not convertible rather than unsupported,
/// since the same image is still valid under Legacy.
pub fn validate_manifest_media_type(
    media_type: &str,
    variant: IndexVariant,
) -> Result<(), ValidationError> {
    let single_platform =
        matches!(media_type, OCI_IMAGE_MEDIA_TYPE | IMAGE_MANIFEST_MEDIA_TYPE);
    let multi_platform = matches!(
        media_type,
        OCI_IMAGE_INDEX_MEDIA_TYPE | IMAGE_MANIFEST_LIST_MEDIA_TYPE
    );

    if !single_platform && !multi_platform {
        return Err(ValidationError::UnsupportedMediaType(media_type.to_string()));
    }
    if variant == IndexVariant::Convert && multi_platform {
        return Err(ValidationError::NotConvertible(media_type.to_string()));
    }
    Ok(())
}
