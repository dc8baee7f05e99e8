//! Error types for branch operations.

use thiserror::Error;

/// Errors that can occur during branch operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    /// The branch was not found.
    #[error("branch not found: {name}")]
    NotFound { name: String },

    /// A branch with this name already exists somewhere in the tree.
    #[error("branch already exists: {name}")]
    AlreadyExists { name: String },

    /// The branch name is invalid.
    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// The root branch can never be deleted.
    #[error("cannot delete protected branch: {name}")]
    ProtectedBranch { name: String },

    /// Cannot delete the checked-out branch or one of its ancestors.
    #[error("cannot delete branch {name}: it contains the current branch {current}")]
    DeleteCurrentBranch { name: String, current: String },

    /// The arena no longer describes a well-formed tree.
    #[error("branch tree invariant violated: {0}")]
    InvariantViolation(String),

    /// A stored branch record does not describe a valid tree.
    #[error("invalid branch record: {0}")]
    InvalidRecord(String),
}

/// Convenience type alias for branch operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
