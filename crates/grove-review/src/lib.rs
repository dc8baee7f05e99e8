//! Pull requests for grove.
//!
//! A pull request proposes merging one branch into another. It captures the
//! staging area at creation time and moves through a one-way status life
//! cycle: `pending -> reviewing -> approved -> merged`, with `rejected`
//! reachable from `pending` or `reviewing`. Cancelling removes the request
//! from the queue instead of transitioning it.

pub mod error;
pub mod pull_request;
pub mod queue;

pub use error::{ReviewError, ReviewResult};
pub use pull_request::{PrId, PrStatus, PullRequest};
pub use queue::{NewPullRequest, PullRequestQueue, QueueRecord};
