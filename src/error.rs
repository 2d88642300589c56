//! Error types for the analysis core.

use std::path::PathBuf;

/// Fatal conditions of an analysis run.
///
/// Everything else (unreadable files, malformed recommendations, unresolved
/// association targets) degrades to a fallback instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The root directory does not exist or cannot be read.
    #[error("source root {} is not an accessible directory", path.display())]
    InaccessibleRoot {
        /// The requested root.
        path: PathBuf,
    },
    /// Listing the tree failed after the root was found accessible.
    #[error("failed to walk {}: {message}", path.display())]
    Walk {
        /// The requested root.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}
