use crate::pull_request::{PrId, PrStatus};

/// Errors produced by pull request operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("pull request #{0} not found")]
    NotFound(PrId),

    #[error("pull request #{id} cannot go from {from} to {to}")]
    InvalidTransition { id: PrId, from: PrStatus, to: PrStatus },

    #[error("source and target branch are both {0}")]
    SameBranch(String),

    #[error("pull request #{0} appears more than once")]
    DuplicateId(PrId),
}

pub type ReviewResult<T> = Result<T, ReviewError>;
