//! Target tree root validation.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ports::FileSystem;

/// A directory verified to have the expected upstream shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRoot {
    path: PathBuf,
}

impl TreeRoot {
    /// Verifies that `path` is a directory containing the `marker` subdirectory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if either check fails.
    pub fn open(fs: &dyn FileSystem, path: &Path, marker: &str) -> Result<Self> {
        if !fs.is_dir(path) {
            return Err(Error::config(format!("tree root {} is not a directory", path.display())));
        }
        if !marker.is_empty() && !fs.is_dir(&path.join(marker)) {
            return Err(Error::config(format!(
                "{} does not look like the target tree: missing {marker}/",
                path.display()
            )));
        }
        Ok(Self { path: path.to_path_buf() })
    }

    /// The root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a unit target relative to the root.
    #[must_use]
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.path.join(relative)
    }
}
