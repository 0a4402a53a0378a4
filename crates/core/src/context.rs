//! Structured log context for a pipeline run.

use crate::ImageReference;

/// Immutable context fields attached to progress and diagnostic events.
///
/// Threaded explicitly through the pipeline as a parameter, never held as
/// ambient global state. The index digest is absent until the builder has
/// produced an artifact.
#[derive(Debug, Clone)]
pub struct RunContext {
    registry_url: String,
    image: String,
    index_digest: Option<String>,
}

impl RunContext {
    /// Start a context for a run against the given image.
    #[must_use]
    pub fn new(image: &ImageReference) -> Self {
        Self {
            registry_url: image.registry().to_string(),
            image: image.canonical(),
            index_digest: None,
        }
    }

    /// A copy of this context carrying the produced index digest.
    #[must_use]
    pub fn with_index_digest(&self, digest: impl Into<String>) -> Self {
        Self {
            registry_url: self.registry_url.clone(),
            image: self.image.clone(),
            index_digest: Some(digest.into()),
        }
    }

    /// The registry endpoint this run targets.
    #[must_use]
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Canonical image name for this run.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// The produced index digest, once known.
    #[must_use]
    pub fn index_digest(&self) -> Option<&str> {
        self.index_digest.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_context_fields() {
        let image = ImageReference::new("app", DIGEST, "us-east-1", "111122223333").unwrap();
        let ctx = RunContext::new(&image);
        assert_eq!(ctx.registry_url(), image.registry());
        assert_eq!(ctx.image(), image.canonical());
        assert!(ctx.index_digest().is_none());
    }

    #[test]
    fn test_with_index_digest_does_not_mutate() {
        let image = ImageReference::new("app", DIGEST, "us-east-1", "111122223333").unwrap();
        let ctx = RunContext::new(&image);
        let tagged = ctx.with_index_digest("sha256:feed");
        assert!(ctx.index_digest().is_none());
        assert_eq!(tagged.index_digest(), Some("sha256:feed"));
        assert_eq!(tagged.registry_url(), ctx.registry_url());
    }
}
