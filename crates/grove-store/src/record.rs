use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// The kinds of durable record a repository keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    /// The commit chain, oldest first.
    Commits,
    /// The pull-request queue, front first.
    PullRequests,
    /// The branch tree, nested from `main`.
    Branches,
    /// The contributor directory, in BST preorder.
    Contributors,
    /// The staging area.
    Staging,
    /// Current branch and current commit pointers.
    Head,
    /// Roles, their permissions, and user assignments.
    Roles,
}

impl RecordKind {
    pub const ALL: [RecordKind; 7] = [
        RecordKind::Commits,
        RecordKind::PullRequests,
        RecordKind::Branches,
        RecordKind::Contributors,
        RecordKind::Staging,
        RecordKind::Head,
        RecordKind::Roles,
    ];

    /// Stable name used for file names and log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Commits => "commits",
            Self::PullRequests => "pull_requests",
            Self::Branches => "branches",
            Self::Contributors => "contributors",
            Self::Staging => "staging",
            Self::Head => "head",
            Self::Roles => "roles",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Durable record storage keyed by record kind, scoped to one repository.
///
/// Implementations store opaque bytes; [`load_record`] and [`save_record`]
/// handle the JSON encoding.
pub trait RecordStore: Send + Sync {
    /// Whether the repository has been initialized.
    fn is_initialized(&self) -> StoreResult<bool>;

    /// Initialize the repository. Returns `false` if it already was.
    fn initialize(&self) -> StoreResult<bool>;

    /// Read a record. Returns `Ok(None)` if it has never been written.
    fn read_record(&self, kind: RecordKind) -> StoreResult<Option<Vec<u8>>>;

    /// Replace a record wholesale.
    fn write_record(&self, kind: RecordKind, data: &[u8]) -> StoreResult<()>;
}

/// Load and decode a JSON record. Absence is `Ok(None)`.
pub fn load_record<T: DeserializeOwned>(
    store: &dyn RecordStore,
    kind: RecordKind,
) -> StoreResult<Option<T>> {
    let Some(bytes) = store.read_record(kind)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Serialization {
            kind,
            reason: e.to_string(),
        })
}

/// Encode a value as pretty JSON and replace the record with it.
pub fn save_record<T: Serialize + ?Sized>(
    store: &dyn RecordStore,
    kind: RecordKind,
    value: &T,
) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization {
        kind,
        reason: e.to_string(),
    })?;
    store.write_record(kind, &bytes)
}
