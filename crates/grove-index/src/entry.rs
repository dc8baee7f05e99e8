//! Staging entry types.

use std::fmt;

use grove_types::Fingerprint;
use serde::{Deserialize, Serialize};

/// Whether a staged file is new to staging or a changed re-stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("A"),
            Self::Modified => f.write_str("M"),
        }
    }
}

/// A file prepared for the next commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingEntry {
    /// Relative path from the working root, `/`-separated.
    pub path: String,
    /// Fingerprint of the content at staging time.
    pub fingerprint: Fingerprint,
    pub kind: ChangeKind,
}

impl StagingEntry {
    pub fn added(path: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            path: path.into(),
            fingerprint,
            kind: ChangeKind::Added,
        }
    }
}

/// What staging a file did to the staging area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// A new entry was appended.
    Added,
    /// An existing entry got a new fingerprint and is now `Modified`.
    Modified,
    /// The file was already staged with the same content; nothing changed.
    Unchanged,
}

impl StageOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}
