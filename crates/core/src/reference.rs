//! Image references and ECR endpoint derivation.

use std::fmt;

use crate::{Error, Result};

/// Derive the ECR registry URL for an account in a region.
///
/// Regions prefixed `cn` live in the China partition and use the
/// `.amazonaws.com.cn` suffix; every other partition uses `.amazonaws.com`.
///
/// Example: region `us-west-2`, account `123456789012` →
/// `123456789012.dkr.ecr.us-west-2.amazonaws.com`.
#[must_use]
pub fn ecr_registry_url(region: &str, account: &str) -> String {
    let aws_domain = if region.starts_with("cn") {
        ".amazonaws.com.cn"
    } else {
        ".amazonaws.com"
    };
    format!("{account}.dkr.ecr.{region}{aws_domain}")
}

/// A fully specified image in a remote registry.
///
/// Immutable once constructed; the registry endpoint is derived from
/// region and account, never stored independently by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    repository: String,
    digest: String,
    registry: String,
}

impl ImageReference {
    /// Build a reference from its parts, deriving the ECR endpoint.
    ///
    /// Rejects empty repository or digest. Digest *syntax* is checked later
    /// during registry validation, where failures become skips rather than
    /// configuration errors.
    pub fn new(repository: &str, digest: &str, region: &str, account: &str) -> Result<Self> {
        if repository.is_empty() {
            return Err(Error::empty_field("repository"));
        }
        if digest.is_empty() {
            return Err(Error::empty_field("digest"));
        }
        Ok(Self {
            repository: repository.to_string(),
            digest: digest.to_string(),
            registry: ecr_registry_url(region, account),
        })
    }

    /// The repository name within the registry.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The content digest identifying the image.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The derived registry endpoint.
    #[must_use]
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Canonical `repository@digest` name for the image.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}@{}", self.repository, self.digest)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.registry, self.repository, self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_standard_partition_endpoint() {
        assert_eq!(
            ecr_registry_url("us-west-2", "123456789012"),
            "123456789012.dkr.ecr.us-west-2.amazonaws.com"
        );
    }

    #[test]
    fn test_china_partition_endpoint() {
        assert_eq!(
            ecr_registry_url("cn-north-1", "123456789012"),
            "123456789012.dkr.ecr.cn-north-1.amazonaws.com.cn"
        );
    }

    #[test]
    fn test_gov_partition_uses_standard_suffix() {
        // Only `cn` regions branch; gov regions take the standard suffix.
        assert!(ecr_registry_url("us-gov-west-1", "1111").ends_with(".amazonaws.com"));
    }

    #[test]
    fn test_non_cn_regions_end_in_amazonaws_com() {
        for region in ["us-east-1", "eu-central-1", "ap-southeast-2"] {
            let url = ecr_registry_url(region, "111122223333");
            assert!(url.ends_with(".amazonaws.com"), "{url}");
            assert!(!url.ends_with(".amazonaws.com.cn"));
        }
    }

    #[test]
    fn test_reference_parts() {
        let r = ImageReference::new("app", DIGEST, "us-east-1", "111122223333").unwrap();
        assert_eq!(r.repository(), "app");
        assert_eq!(r.digest(), DIGEST);
        assert_eq!(r.registry(), "111122223333.dkr.ecr.us-east-1.amazonaws.com");
        assert_eq!(r.canonical(), format!("app@{DIGEST}"));
    }

    #[test]
    fn test_reference_rejects_empty_repository() {
        let r = ImageReference::new("", DIGEST, "us-east-1", "111122223333");
        assert!(matches!(r, Err(Error::EmptyField("repository"))));
    }

    #[test]
    fn test_reference_rejects_empty_digest() {
        let r = ImageReference::new("app", "", "us-east-1", "111122223333");
        assert!(matches!(r, Err(Error::EmptyField("digest"))));
    }

    #[test]
    fn test_reference_display() {
        let r = ImageReference::new("app", DIGEST, "us-east-1", "111122223333").unwrap();
        let s = r.to_string();
        assert!(s.starts_with("111122223333.dkr.ecr.us-east-1.amazonaws.com/app@"));
    }
}
