//! Filesystem port for tree and ledger I/O.

use std::path::Path;

/// Boxed error type returned by every port method.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Provides filesystem access for reading and writing files.
///
/// The engine and the ledger do all their I/O through this trait so they can
/// run against an in-memory tree in tests.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError>;

    /// Replaces the file's contents in one step.
    ///
    /// Readers observe either the old or the new contents, never a mix.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Appends to a file, creating it and its parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    fn append(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Returns `true` if the path exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if the path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the entry names in a directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a directory or cannot be read.
    fn list_dir(&self, path: &Path) -> Result<Vec<String>, PortError>;
}
