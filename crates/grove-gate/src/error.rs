/// Errors produced by contributor and permission operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("contributor already exists: {0}")]
    DuplicateContributor(String),

    #[error("contributor not found: {0}")]
    ContributorNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A required name was empty or blank.
    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    #[error("tree invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type GateResult<T> = Result<T, GateError>;

/// Reject empty or whitespace-only names.
pub(crate) fn require_name(field: &'static str, value: &str) -> GateResult<()> {
    if value.trim().is_empty() {
        return Err(GateError::EmptyName(field));
    }
    Ok(())
}
