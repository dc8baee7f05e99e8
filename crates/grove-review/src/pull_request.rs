use std::fmt;

use grove_index::StagingEntry;
use grove_types::{CommitId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, ReviewResult};

/// Pull request number, unique within a repository's queue.
pub type PrId = u64;

/// Where a pull request is in its life cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrStatus {
    Pending,
    Reviewing,
    Approved,
    Rejected,
    Merged,
    Cancelled,
}

impl PrStatus {
    /// Returns `true` if moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: PrStatus) -> bool {
        use PrStatus::*;
        matches!(
            (self, next),
            (Pending, Reviewing)
                | (Pending, Rejected)
                | (Reviewing, Approved)
                | (Reviewing, Rejected)
                | (Approved, Merged)
                | (Pending | Reviewing | Approved | Rejected | Merged, Cancelled)
        )
    }

    /// Rejected, merged and cancelled requests never change again.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Rejected | Self::Merged | Self::Cancelled)
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Merged => "merged",
            Self::Cancelled => "cancelled",
        };
        f.pad(s)
    }
}

/// A proposed merge of `source` into `target`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: PrId,
    #[serde(default)]
    pub title: String,
    pub source: String,
    pub target: String,
    pub status: PrStatus,
    /// Staging area captured when the request was created.
    pub files: Vec<StagingEntry>,
    pub author: String,
    pub created_at: Timestamp,
    pub merged_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    /// Commit produced by approving the request.
    pub merge_commit: Option<CommitId>,
}

impl PullRequest {
    /// Move to `next`, failing if the life cycle forbids it.
    pub fn transition(&mut self, next: PrStatus) -> ReviewResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ReviewError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        tracing::debug!(id = self.id, from = %self.status, to = %next, "pull request transition");
        self.status = next;
        Ok(())
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}
