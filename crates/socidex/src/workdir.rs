//! Per-run working directory with guaranteed release.
//!
//! Each pipeline run gets a uniquely named directory holding the local
//! OCI store and the artifact catalog. Release is idempotent and also
//! runs on drop, so early returns and panics cannot leak directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

/// RAII handle for one run's working directory.
#[derive(Debug)]
pub struct WorkDir {
    root: PathBuf,
    released: bool,
}

impl WorkDir {
    /// Create a fresh working directory under `base`.
    ///
    /// Free space on the backing filesystem is logged up front; a run that
    /// fails later for lack of space is much easier to diagnose with this
    /// number in the log.
    pub fn acquire(base: &Path) -> io::Result<Self> {
        fs::create_dir_all(base)?;

        match fs2::free_space(base) {
            Ok(bytes) => info!(base = %base.display(), free_bytes = bytes, "Workspace free space"),
            Err(e) => warn!(base = %base.display(), error = %e, "Could not determine free space"),
        }

        let root = base.join(format!("socidex-{}", Uuid::new_v4()));
        fs::create_dir(&root)?;
        debug!(workdir = %root.display(), "Acquired working directory");
        Ok(Self {
            root,
            released: false,
        })
    }

    /// The directory root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Where the local OCI store lives for this run.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.root.join("store")
    }

    /// Where the artifact catalog lives for this run.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join("artifacts.db")
    }

    /// Delete the directory. Safe to call more than once; removal failure
    /// is logged rather than propagated since the run's outcome is already
    /// decided by the time release happens.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match fs::remove_dir_all(&self.root) {
            Ok(()) => debug!(workdir = %self.root.display(), "Released working directory"),
            Err(e) => warn!(workdir = %self.root.display(), error = %e, "Failed to remove working directory"),
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_unique_directories() {
        let base = TempDir::new().unwrap();
        let a = WorkDir::acquire(base.path()).unwrap();
        let b = WorkDir::acquire(base.path()).unwrap();
        assert!(a.path().exists());
        assert!(b.path().exists());
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_release_removes_directory() {
        let base = TempDir::new().unwrap();
        let mut workdir = WorkDir::acquire(base.path()).unwrap();
        let path = workdir.path().to_path_buf();
        std::fs::write(path.join("leftover"), b"x").unwrap();

        workdir.release();
        assert!(!path.exists());

        // Idempotent.
        workdir.release();
    }

    #[test]
    fn test_drop_releases() {
        let base = TempDir::new().unwrap();
        let path = {
            let workdir = WorkDir::acquire(base.path()).unwrap();
            workdir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_paths_live_under_root() {
        let base = TempDir::new().unwrap();
        let workdir = WorkDir::acquire(base.path()).unwrap();
        assert!(workdir.store_path().starts_with(workdir.path()));
        assert!(workdir.catalog_path().starts_with(workdir.path()));
    }
}
