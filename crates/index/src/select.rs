//! Canonical-artifact selection over the two builder result shapes.

use socidex_core::ArtifactDescriptor;

use crate::{Error, Result};

/// Result of one builder invocation, tagged by protocol variant.
///
/// Legacy builds yield a candidate list that still needs selection;
/// convert yields the descriptor directly. Keeping the selection policy
/// behind one resolve step keeps it out of the pipeline's control flow.
#[derive(Debug, Clone)]
pub enum BuiltIndex {
    /// Legacy: catalog candidates awaiting selection.
    Candidates(Vec<ArtifactDescriptor>),
    /// Convert: the single produced descriptor.
    Converted(ArtifactDescriptor),
}

impl BuiltIndex {
    /// Resolve to the one artifact that gets pushed.
    ///
    /// Among legacy candidates the latest creation timestamp wins; ties go
    /// to the last maximum in input order, which matches sorting ascending
    /// and taking the last element. Builder timestamps are produced
    /// monotonically, so no secondary key is needed beyond stability.
    /// An empty candidate list is the builder/catalog inconsistency error.
    pub fn resolve(self) -> Result<ArtifactDescriptor> {
        match self {
            Self::Converted(descriptor) => Ok(descriptor),
            Self::Candidates(candidates) => candidates
                .into_iter()
                .max_by_key(|c| c.created_at)
                .ok_or(Error::NoArtifacts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn candidate(digest: &str, secs: i64) -> ArtifactDescriptor {
        ArtifactDescriptor {
            digest: digest.to_string(),
            media_type: "application/vnd.oci.image.manifest.v1+json".to_string(),
            size: 1,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_converted_passes_through() {
        let desc = candidate("sha256:only", 100);
        let resolved = BuiltIndex::Converted(desc.clone()).resolve().unwrap();
        assert_eq!(resolved, desc);
    }

    #[test]
    fn test_empty_candidates_is_terminal() {
        let err = BuiltIndex::Candidates(Vec::new()).resolve().unwrap_err();
        assert!(matches!(err, Error::NoArtifacts));
    }

    #[test]
    fn test_latest_timestamp_wins() {
        let built = BuiltIndex::Candidates(vec![
            candidate("sha256:old", 100),
            candidate("sha256:new", 200),
            candidate("sha256:mid", 150),
        ]);
        assert_eq!(built.resolve().unwrap().digest, "sha256:new");
    }

    #[test]
    fn test_single_candidate() {
        let built = BuiltIndex::Candidates(vec![candidate("sha256:one", 42)]);
        assert_eq!(built.resolve().unwrap().digest, "sha256:one");
    }

    proptest! {
        // Selection is order-independent: any permutation of candidates
        // with distinct timestamps resolves to the same descriptor.
        #[test]
        fn prop_selection_is_permutation_stable(
            mut offsets in proptest::collection::vec(0i64..10_000, 1..8),
        ) {
            offsets.sort_unstable();
            offsets.dedup();

            let candidates: Vec<ArtifactDescriptor> = offsets
                .iter()
                .map(|s| candidate(&format!("sha256:{s:064x}"), *s))
                .collect();
            let expected = BuiltIndex::Candidates(candidates.clone())
                .resolve()
                .unwrap();

            let mut rotated = candidates;
            for _ in 0..rotated.len() {
                rotated.rotate_left(1);
                let picked = BuiltIndex::Candidates(rotated.clone()).resolve().unwrap();
                prop_assert_eq!(&picked, &expected);
            }
        }
    }
}
