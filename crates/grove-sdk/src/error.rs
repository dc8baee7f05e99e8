use std::fmt;

use grove_gate::GateError;
use grove_index::IndexError;
use grove_ledger::LedgerError;
use grove_merge::MergeError;
use grove_refs::RefError;
use grove_review::ReviewError;
use grove_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("repository not initialized at {0}")]
    NotInitialized(String),

    #[error("nothing to commit: staging area is empty")]
    EmptyStaging,

    #[error("no branch or commit named {0}")]
    UnknownTarget(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Index(#[from] IndexError),

    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("{0}")]
    Ref(#[from] RefError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("{0}")]
    Gate(#[from] GateError),

    #[error("pull request error: {0}")]
    Review(#[from] ReviewError),
}

/// Coarse classification of a failure, used by callers to decide how to
/// report it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The repository is not in a state where the command can run.
    Precondition,
    /// A named commit, branch, contributor, request or user does not exist.
    NotFound,
    /// The command would duplicate or destroy something it must not.
    Conflict,
    /// A data structure is no longer well-formed. Always a bug.
    Invariant,
    /// Reading or writing records or working files failed.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Precondition => "precondition",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Invariant => "invariant violation",
            ErrorKind::Storage => "storage",
        })
    }
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        use ErrorKind::*;
        match self {
            SdkError::NotInitialized(_)
            | SdkError::EmptyStaging
            | SdkError::Config(_)
            | SdkError::InvalidOperation(_) => Precondition,
            SdkError::UnknownTarget(_) => NotFound,
            SdkError::Store(e) => match e {
                StoreError::NotInitialized => Precondition,
                StoreError::InvalidDegree(_) => Precondition,
                StoreError::InvariantViolation(_) => Invariant,
                StoreError::Serialization { .. } | StoreError::Io(_) => Storage,
            },
            SdkError::Index(e) => match e {
                IndexError::PathNotFound(_) => NotFound,
                IndexError::InvalidPath(_) => Precondition,
                IndexError::DuplicateEntry(_) | IndexError::Io(_) => Storage,
            },
            SdkError::Ledger(e) => match e {
                LedgerError::RedundantCommit { .. }
                | LedgerError::DuplicateCommit(_)
                | LedgerError::AmbiguousPrefix { .. } => Conflict,
                LedgerError::CommitNotFound(_) => NotFound,
                LedgerError::ParentMismatch { .. } | LedgerError::IntegrityViolation { .. } => {
                    Invariant
                }
            },
            SdkError::Ref(e) => match e {
                RefError::NotFound { .. } => NotFound,
                RefError::AlreadyExists { .. }
                | RefError::ProtectedBranch { .. }
                | RefError::DeleteCurrentBranch { .. } => Conflict,
                RefError::InvalidBranchName { .. } => Precondition,
                RefError::InvariantViolation(_) => Invariant,
                RefError::InvalidRecord(_) => Storage,
            },
            SdkError::Merge(MergeError::MissingCommit { .. }) => Precondition,
            SdkError::Gate(e) => match e {
                GateError::DuplicateContributor(_) => Conflict,
                GateError::ContributorNotFound(_) | GateError::UserNotFound(_) => NotFound,
                GateError::EmptyName(_) => Precondition,
                GateError::InvariantViolation(_) => Invariant,
                GateError::InvalidRecord(_) => Storage,
            },
            SdkError::Review(e) => match e {
                ReviewError::NotFound(_) => NotFound,
                ReviewError::InvalidTransition { .. } | ReviewError::SameBranch(_) => Precondition,
                ReviewError::DuplicateId(_) => Storage,
            },
        }
    }

    /// `false` only for structural invariant violations.
    pub fn is_user_facing(&self) -> bool {
        self.kind() != ErrorKind::Invariant
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
