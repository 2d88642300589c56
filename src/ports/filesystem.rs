//! Filesystem port for walking and reading the analyzed tree.

use std::path::Path;

/// Boxed error type shared by the port traits.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Provides filesystem access for the extractor, estimator and CLI output.
///
/// Abstracting the filesystem allows deterministic replay and testing
/// without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError>;

    /// Writes the given contents to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Returns `true` if the path is an accessible directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists every regular file below `root` as a `/`-separated path relative
    /// to `root`, in file-name sorted walk order.
    ///
    /// Directories whose name is in `skip_dirs` are not descended into.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` itself cannot be read.
    fn walk_files(&self, root: &Path, skip_dirs: &[String]) -> Result<Vec<String>, PortError>;
}
