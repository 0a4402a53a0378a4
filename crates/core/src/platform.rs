//! Platform detection for candidate enumeration.
//!
//! Legacy-variant catalog lookups filter produced artifacts to the
//! default (host) platform, mirroring OCI `os/arch` specs.

use std::fmt;

/// A normalized platform specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system (linux, darwin, windows).
    pub os: String,
    /// Architecture (amd64, arm64).
    pub arch: String,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Get the default platform for this host in OCI terms.
#[must_use]
pub fn current_platform() -> Platform {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };
    Platform::new(os, arch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_display_is_oci_style() {
        let p = Platform::new("linux", "amd64");
        assert_eq!(p.to_string(), "linux/amd64");
    }

    #[test]
    fn test_current_platform_nonempty() {
        let p = current_platform();
        assert!(!p.os.is_empty());
        assert!(!p.arch.is_empty());
    }

    #[test]
    fn test_platform_equality() {
        assert_eq!(Platform::new("linux", "arm64"), Platform::new("linux", "arm64"));
        assert_ne!(Platform::new("linux", "arm64"), Platform::new("linux", "amd64"));
    }
}
