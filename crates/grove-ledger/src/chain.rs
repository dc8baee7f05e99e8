use std::collections::{HashMap, HashSet};

use grove_types::{CommitId, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::commit::Commit;
use crate::error::{LedgerError, LedgerResult};

/// Shortest hex prefix accepted by [`CommitChain::resolve`].
pub const MIN_PREFIX_LEN: usize = 4;

/// Append-only commit history.
///
/// Commits are kept in insertion order. Each commit's parent is the commit
/// before it, so the chain can be walked forwards by position and backwards
/// by parent link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Commit>", into = "Vec<Commit>")]
pub struct CommitChain {
    commits: Vec<Commit>,
    positions: HashMap<CommitId, usize>,
}

impl CommitChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a chain from stored commits, validating every link.
    pub fn from_commits(commits: Vec<Commit>) -> LedgerResult<Self> {
        let mut chain = Self::new();
        for (index, commit) in commits.into_iter().enumerate() {
            if !commit.verify_id() {
                return Err(LedgerError::IntegrityViolation {
                    index,
                    reason: format!("commit {} does not match its content", commit.id),
                });
            }
            chain
                .append_unchecked(commit)
                .map_err(|e| LedgerError::IntegrityViolation {
                    index,
                    reason: e.to_string(),
                })?;
        }
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// The most recently appended commit.
    pub fn tail(&self) -> Option<&Commit> {
        self.commits.last()
    }

    pub fn tail_id(&self) -> Option<CommitId> {
        self.tail().map(|c| c.id)
    }

    /// Oldest-first iteration; call `.rev()` for newest-first.
    pub fn iter(&self) -> std::slice::Iter<'_, Commit> {
        self.commits.iter()
    }

    pub fn get(&self, id: &CommitId) -> Option<&Commit> {
        self.positions.get(id).map(|&i| &self.commits[i])
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.positions.contains_key(id)
    }

    /// The commit recorded as `id`'s parent.
    pub fn parent_of(&self, id: &CommitId) -> Option<&Commit> {
        self.get(id)?.parent.as_ref().and_then(|p| self.get(p))
    }

    /// The commit appended directly after `id`.
    pub fn child_of(&self, id: &CommitId) -> Option<&Commit> {
        self.positions
            .get(id)
            .and_then(|&i| self.commits.get(i + 1))
    }

    /// First commit whose message and file set equal the given ones.
    pub fn find_redundant<S: AsRef<str>>(&self, message: &str, files: &[S]) -> Option<&Commit> {
        self.commits
            .iter()
            .find(|c| c.is_redundant_with(message, files))
    }

    /// Append `commit` at the tail.
    ///
    /// Fails if the commit duplicates an existing message and file set, if
    /// its id is already present, or if its parent is not the current tail.
    /// The chain is unchanged on failure.
    pub fn append(&mut self, commit: Commit) -> LedgerResult<&Commit> {
        let files = commit.staged_files();
        if let Some(existing) = self.find_redundant(&commit.message, &files) {
            return Err(LedgerError::RedundantCommit {
                message: commit.message.clone(),
                existing: existing.id,
            });
        }
        self.append_unchecked(commit)
    }

    fn append_unchecked(&mut self, commit: Commit) -> LedgerResult<&Commit> {
        if self.contains(&commit.id) {
            return Err(LedgerError::DuplicateCommit(commit.id));
        }
        let expected = self.tail_id();
        if commit.parent != expected {
            return Err(LedgerError::ParentMismatch {
                expected,
                actual: commit.parent,
            });
        }
        tracing::debug!(id = %commit.id, position = self.commits.len(), "appending commit");
        self.positions.insert(commit.id, self.commits.len());
        self.commits.push(commit);
        let index = self.commits.len() - 1;
        Ok(&self.commits[index])
    }

    /// Look a commit up by short id, full id or unambiguous hex prefix.
    pub fn resolve(&self, target: &str) -> LedgerResult<&Commit> {
        if target.len() < MIN_PREFIX_LEN || !target.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::CommitNotFound(target.to_string()));
        }
        let mut matches = self.commits.iter().filter(|c| c.id.has_prefix(target));
        let first = matches
            .next()
            .ok_or_else(|| LedgerError::CommitNotFound(target.to_string()))?;
        let extra = matches.count();
        if extra > 0 {
            return Err(LedgerError::AmbiguousPrefix {
                prefix: target.to_string(),
                matches: extra + 1,
            });
        }
        Ok(first)
    }

    /// Every file fingerprint recorded anywhere in history.
    pub fn fingerprints(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.commits
            .iter()
            .flat_map(|c| c.files.iter().map(|f| f.fingerprint))
    }

    /// Every path recorded anywhere in history.
    pub fn committed_paths(&self) -> HashSet<String> {
        self.commits
            .iter()
            .flat_map(|c| c.files.iter().map(|f| f.path.clone()))
            .collect()
    }

    /// Check ids, parent links and position index over the whole chain.
    pub fn validate(&self) -> LedgerResult<()> {
        let mut previous: Option<CommitId> = None;
        for (index, commit) in self.commits.iter().enumerate() {
            if !commit.verify_id() {
                return Err(LedgerError::IntegrityViolation {
                    index,
                    reason: "commit id does not match its content".into(),
                });
            }
            if commit.parent != previous {
                return Err(LedgerError::IntegrityViolation {
                    index,
                    reason: "parent link does not point at the previous commit".into(),
                });
            }
            if self.positions.get(&commit.id) != Some(&index) {
                return Err(LedgerError::IntegrityViolation {
                    index,
                    reason: "position index out of date".into(),
                });
            }
            previous = Some(commit.id);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CommitChain {
    type Item = &'a Commit;
    type IntoIter = std::slice::Iter<'a, Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl TryFrom<Vec<Commit>> for CommitChain {
    type Error = LedgerError;

    fn try_from(commits: Vec<Commit>) -> LedgerResult<Self> {
        Self::from_commits(commits)
    }
}

impl From<CommitChain> for Vec<Commit> {
    fn from(chain: CommitChain) -> Self {
        chain.commits
    }
}
