use std::collections::{HashSet, VecDeque};

use grove_index::StagingEntry;
use grove_types::{CommitId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, ReviewResult};
use crate::pull_request::{PrId, PrStatus, PullRequest};

/// Parameters for [`PullRequestQueue::create`].
#[derive(Clone, Debug)]
pub struct NewPullRequest {
    pub source: String,
    pub target: String,
    pub title: Option<String>,
    pub author: String,
    pub files: Vec<StagingEntry>,
}

/// Pull requests in creation order.
///
/// Ids come from a counter that only grows, so `cancel` and `clear` never
/// lead to an id being handed out twice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QueueRecord", into = "QueueRecord")]
pub struct PullRequestQueue {
    items: VecDeque<PullRequest>,
    next_id: PrId,
}

impl Default for PullRequestQueue {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 1,
        }
    }
}

/// On-disk shape of the queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueRecord {
    #[serde(default)]
    pub next_id: PrId,
    pub requests: Vec<PullRequest>,
}

impl PullRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PullRequest> {
        self.items.iter()
    }

    pub fn get(&self, id: PrId) -> ReviewResult<&PullRequest> {
        self.items
            .iter()
            .find(|pr| pr.id == id)
            .ok_or(ReviewError::NotFound(id))
    }

    fn get_mut(&mut self, id: PrId) -> ReviewResult<&mut PullRequest> {
        self.items
            .iter_mut()
            .find(|pr| pr.id == id)
            .ok_or(ReviewError::NotFound(id))
    }

    /// Id the next created request will get.
    pub fn next_id(&self) -> PrId {
        self.next_id
    }

    /// Enqueue a new `pending` request.
    pub fn create(&mut self, request: NewPullRequest, now: Timestamp) -> ReviewResult<&PullRequest> {
        if request.source == request.target {
            return Err(ReviewError::SameBranch(request.source));
        }
        let id = self.next_id;
        self.next_id += 1;
        let title = request
            .title
            .unwrap_or_else(|| format!("{} -> {}", request.source, request.target));
        self.items.push_back(PullRequest {
            id,
            title,
            source: request.source,
            target: request.target,
            status: PrStatus::Pending,
            files: request.files,
            author: request.author,
            created_at: now,
            merged_at: None,
            closed_at: None,
            merge_commit: None,
        });
        tracing::debug!(id, "created pull request");
        let index = self.items.len() - 1;
        Ok(&self.items[index])
    }

    /// Move the oldest `pending` request to `reviewing`.
    ///
    /// Returns `None` when nothing is pending.
    pub fn advance_next(&mut self) -> ReviewResult<Option<&PullRequest>> {
        let Some(index) = self
            .items
            .iter()
            .position(|pr| pr.status == PrStatus::Pending)
        else {
            return Ok(None);
        };
        self.items[index].transition(PrStatus::Reviewing)?;
        Ok(Some(&self.items[index]))
    }

    /// The request `id`, provided it is `reviewing` and may be approved.
    pub fn approvable(&self, id: PrId) -> ReviewResult<&PullRequest> {
        let pr = self.get(id)?;
        if pr.status != PrStatus::Reviewing {
            return Err(ReviewError::InvalidTransition {
                id,
                from: pr.status,
                to: PrStatus::Approved,
            });
        }
        Ok(pr)
    }

    /// Approve and merge `id`, recording the merge commit.
    pub fn mark_merged(&mut self, id: PrId, commit: CommitId, now: Timestamp) -> ReviewResult<&PullRequest> {
        self.approvable(id)?;
        let pr = self.get_mut(id)?;
        pr.transition(PrStatus::Approved)?;
        pr.transition(PrStatus::Merged)?;
        pr.merge_commit = Some(commit);
        pr.merged_at = Some(now);
        pr.closed_at = Some(now);
        Ok(pr)
    }

    /// Reject a `pending` or `reviewing` request.
    pub fn reject(&mut self, id: PrId, now: Timestamp) -> ReviewResult<&PullRequest> {
        let pr = self.get_mut(id)?;
        pr.transition(PrStatus::Rejected)?;
        pr.closed_at = Some(now);
        Ok(pr)
    }

    /// Remove `id` from the queue, returning it marked `cancelled`.
    pub fn cancel(&mut self, id: PrId, now: Timestamp) -> ReviewResult<PullRequest> {
        let index = self
            .items
            .iter()
            .position(|pr| pr.id == id)
            .ok_or(ReviewError::NotFound(id))?;
        self.items[index].transition(PrStatus::Cancelled)?;
        let mut pr = self
            .items
            .remove(index)
            .ok_or(ReviewError::NotFound(id))?;
        pr.closed_at = Some(now);
        Ok(pr)
    }

    /// Remove every request, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }
}

impl TryFrom<QueueRecord> for PullRequestQueue {
    type Error = ReviewError;

    fn try_from(record: QueueRecord) -> ReviewResult<Self> {
        let mut seen = HashSet::new();
        for pr in &record.requests {
            if !seen.insert(pr.id) {
                return Err(ReviewError::DuplicateId(pr.id));
            }
        }
        let floor = record.requests.iter().map(|pr| pr.id).max().unwrap_or(0) + 1;
        Ok(Self {
            items: record.requests.into(),
            next_id: record.next_id.max(floor),
        })
    }
}

impl From<PullRequestQueue> for QueueRecord {
    fn from(queue: PullRequestQueue) -> Self {
        Self {
            next_id: queue.next_id,
            requests: queue.items.into(),
        }
    }
}
