//! Repository session for grove.
//!
//! [`Repository`] owns every structure of a repository (staging area, commit
//! chain, object index, branch tree, pull-request queue, contributor
//! directory and permission registry), loads them from a
//! [`RecordStore`](grove_store::RecordStore) and writes back whatever a
//! command changed. Commands are the closed [`Command`] enum; results are
//! [`Outcome`] values whose `Display` is the human-readable report.

pub mod command;
pub mod config;
pub mod error;
pub mod repository;

pub use command::{BranchCommand, Command, ContributorCommand, Outcome, PrCommand, RoleCommand};
pub use config::{RepoConfig, CONFIG_FILE_NAME};
pub use error::{ErrorKind, SdkError, SdkResult};
pub use repository::{HeadRecord, Repository};

// Re-export key types
pub use grove_gate::{Contributor, UserGrant};
pub use grove_index::{ChangeKind, StageOutcome, WorkdirStatus};
pub use grove_ledger::Commit;
pub use grove_merge::{MergeChange, MergeReport};
pub use grove_review::{PrId, PrStatus, PullRequest};
pub use grove_types::{CommitId, Timestamp};
