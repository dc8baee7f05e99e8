//! Error types for the index crate.

/// Errors that can occur during staging operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The specified file does not exist in the working tree.
    #[error("file not found: {0}")]
    PathNotFound(String),

    /// A loaded staging record lists the same path twice.
    #[error("duplicate staging entry: {0}")]
    DuplicateEntry(String),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Reading the working tree failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
