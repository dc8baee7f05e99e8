use std::collections::BTreeSet;

use grove_crypto::ContentHasher;
use grove_types::{CommitId, Fingerprint, Timestamp};
use serde::{Deserialize, Serialize};

/// A file recorded by a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub path: String,
    pub fingerprint: Fingerprint,
}

impl CommitFile {
    pub fn new(path: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            path: path.into(),
            fingerprint,
        }
    }
}

/// An immutable snapshot of staged files plus metadata.
///
/// The id is derived from the message, the timestamp and the sorted staged
/// filenames, so it cannot drift from the content it names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub message: String,
    pub author: String,
    pub files: Vec<CommitFile>,
    pub parent: Option<CommitId>,
    pub branch: String,
    pub timestamp: Timestamp,
}

impl Commit {
    pub fn new(
        message: impl Into<String>,
        author: impl Into<String>,
        files: Vec<CommitFile>,
        parent: Option<CommitId>,
        branch: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        let message = message.into();
        let id = Self::compute_id(&message, &timestamp, &files);
        Self {
            id,
            message,
            author: author.into(),
            files,
            parent,
            branch: branch.into(),
            timestamp,
        }
    }

    /// Identity over `message`, `timestamp` and the sorted filenames.
    pub fn compute_id(message: &str, timestamp: &Timestamp, files: &[CommitFile]) -> CommitId {
        let mut names: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        names.sort_unstable();
        let stamp = timestamp.to_rfc3339();
        let fields = [message, stamp.as_str()].into_iter().chain(names);
        CommitId::new(ContentHasher::COMMIT.hash_fields(fields))
    }

    /// Returns `true` if the stored id matches the commit's content.
    pub fn verify_id(&self) -> bool {
        Self::compute_id(&self.message, &self.timestamp, &self.files) == self.id
    }

    /// Staged filenames in staging order.
    pub fn staged_files(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Returns `true` if this commit has `message` and the same set of files.
    pub fn is_redundant_with<S: AsRef<str>>(&self, message: &str, files: &[S]) -> bool {
        if self.message != message {
            return false;
        }
        let ours: BTreeSet<&str> = self.files.iter().map(|f| f.path.as_str()).collect();
        let theirs: BTreeSet<&str> = files.iter().map(AsRef::as_ref).collect();
        ours == theirs
    }
}
