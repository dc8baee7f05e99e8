use crate::record::RecordKind;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The repository directory has not been created yet.
    #[error("repository not initialized")]
    NotInitialized,

    /// A record could not be encoded or decoded.
    #[error("serialization error in {kind} record: {reason}")]
    Serialization { kind: RecordKind, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// B-tree minimum degree below 2.
    #[error("invalid B-tree minimum degree {0} (must be at least 2)")]
    InvalidDegree(usize),

    /// A structural invariant of the object index does not hold.
    #[error("object index invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
