//! SOCI index protocol variants.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Which index-construction protocol a run uses.
///
/// The underlying builder evolved from a single-shot "build into a catalog,
/// then look it up" model (`Legacy`, V1) to a direct "convert and get the
/// descriptor" model (`Convert`, V2). Both are supported because consumers
/// may be pinned to either index format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexVariant {
    /// V1: build, then enumerate the catalog and select the newest artifact.
    Legacy,
    /// V2: one convert call yields the descriptor directly.
    Convert,
}

impl IndexVariant {
    /// Whether the CLI must supply an output tag for this variant.
    #[must_use]
    pub fn requires_output_tag(self) -> bool {
        matches!(self, Self::Convert)
    }

    /// Compute the tag pushed alongside the artifact.
    ///
    /// Legacy never pushes a tag (push by digest only). Convert appends the
    /// fixed `-soci` suffix to the caller's base tag when one was supplied,
    /// otherwise pushes by digest as well.
    #[must_use]
    pub fn output_tag(self, base_tag: Option<&str>) -> String {
        match (self, base_tag) {
            (Self::Convert, Some(tag)) if !tag.is_empty() => format!("{tag}-soci"),
            _ => String::new(),
        }
    }
}

impl FromStr for IndexVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "V1" => Ok(Self::Legacy),
            "V2" => Ok(Self::Convert),
            other => Err(Error::InvalidVariant(other.to_string())),
        }
    }
}

impl fmt::Display for IndexVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "V1"),
            Self::Convert => write!(f, "V2"),
        }
    }
}
