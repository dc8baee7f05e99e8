use grove_types::CommitId;

/// Errors produced by commit history operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("nothing new to commit: commit {existing} already records message {message:?} with the same files")]
    RedundantCommit { message: String, existing: CommitId },

    #[error("commit {0} already exists in history")]
    DuplicateCommit(CommitId),

    #[error("commit parent must be the current tail {expected:?}, found {actual:?}")]
    ParentMismatch {
        expected: Option<CommitId>,
        actual: Option<CommitId>,
    },

    #[error("commit not found: {0}")]
    CommitNotFound(String),

    #[error("commit prefix {prefix:?} is ambiguous ({matches} matches)")]
    AmbiguousPrefix { prefix: String, matches: usize },

    #[error("integrity violation at position {index}: {reason}")]
    IntegrityViolation { index: usize, reason: String },
}

pub type LedgerResult<T> = Result<T, LedgerError>;
