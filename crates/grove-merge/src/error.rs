/// Errors produced while building a merge report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("branch {branch} has no commit to merge")]
    MissingCommit { branch: String },
}

pub type MergeResult<T> = Result<T, MergeError>;
