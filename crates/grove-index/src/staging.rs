//! The staging area.

use std::collections::HashSet;

use grove_crypto::ContentHasher;
use grove_types::Fingerprint;
use serde::{Deserialize, Serialize};

use crate::entry::{ChangeKind, StageOutcome, StagingEntry};
use crate::error::{IndexError, IndexResult};
use crate::probe::{normalize_path, FileProbe};
use crate::status::WorkdirStatus;

/// Files prepared for the next commit.
///
/// Entries keep the order in which paths were first staged and there is at
/// most one entry per path. Re-staging identical content is a no-op;
/// re-staging changed content replaces the fingerprint and marks the entry
/// [`ChangeKind::Modified`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StagingEntry>", into = "Vec<StagingEntry>")]
pub struct StagingArea {
    entries: Vec<StagingEntry>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a staging area from stored entries, rejecting duplicate paths.
    pub fn from_entries(entries: Vec<StagingEntry>) -> IndexResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.path.as_str()) {
                return Err(IndexError::DuplicateEntry(entry.path.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&StagingEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn entries(&self) -> &[StagingEntry] {
        &self.entries
    }

    /// Staged paths in staging order.
    pub fn staged_files(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    /// Copy of the current entries, detached from this staging area.
    pub fn snapshot(&self) -> Vec<StagingEntry> {
        self.entries.clone()
    }

    /// Stage `path` with an already computed fingerprint.
    pub fn stage(&mut self, path: impl Into<String>, fingerprint: Fingerprint) -> StageOutcome {
        let path = path.into();
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) if entry.fingerprint == fingerprint => StageOutcome::Unchanged,
            Some(entry) => {
                entry.fingerprint = fingerprint;
                entry.kind = ChangeKind::Modified;
                tracing::debug!(path = %entry.path, "restaged modified file");
                StageOutcome::Modified
            }
            None => {
                tracing::debug!(path = %path, "staged new file");
                self.entries.push(StagingEntry::added(path, fingerprint));
                StageOutcome::Added
            }
        }
    }

    /// Read `path` from the working tree, fingerprint it and stage it.
    ///
    /// Returns the normalized path alongside the outcome.
    pub fn stage_from(
        &mut self,
        probe: &dyn FileProbe,
        path: &str,
    ) -> IndexResult<(String, StageOutcome)> {
        let path = normalize_path(path)?;
        let content = probe
            .read(&path)?
            .ok_or_else(|| IndexError::PathNotFound(path.clone()))?;
        let fingerprint = ContentHasher::BLOB.hash(&content);
        let outcome = self.stage(path.clone(), fingerprint);
        Ok((path, outcome))
    }

    /// Stage every file in the working tree that is new to staging or changed.
    ///
    /// Only files whose staging state changed are reported.
    pub fn stage_all(&mut self, probe: &dyn FileProbe) -> IndexResult<Vec<(String, StageOutcome)>> {
        let mut changed = Vec::new();
        for path in probe.list_files()? {
            let Some(content) = probe.read(&path)? else {
                tracing::warn!(path = %path, "file vanished while staging");
                continue;
            };
            let outcome = self.stage(path.clone(), ContentHasher::BLOB.hash(&content));
            if outcome.changed() {
                changed.push((path, outcome));
            }
        }
        Ok(changed)
    }

    /// Replace all entries with `files`, each marked [`ChangeKind::Added`].
    ///
    /// Later duplicates of a path are dropped.
    pub fn replace_with<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = (P, Fingerprint)>,
        P: Into<String>,
    {
        self.entries.clear();
        for (path, fingerprint) in files {
            let path = path.into();
            if !self.contains(&path) {
                self.entries.push(StagingEntry::added(path, fingerprint));
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Compare staging against the working tree.
    ///
    /// `committed` holds every path recorded in history; such files are not
    /// reported as untracked.
    pub fn status(
        &self,
        probe: &dyn FileProbe,
        committed: &HashSet<String>,
    ) -> IndexResult<WorkdirStatus> {
        let mut status = WorkdirStatus::default();

        for entry in &self.entries {
            status.staged.push((entry.path.clone(), entry.kind));

            match probe.read(&entry.path)? {
                None => status.deleted.push(entry.path.clone()),
                Some(content) if !ContentHasher::BLOB.verify(&content, &entry.fingerprint) => {
                    status.modified.push(entry.path.clone());
                }
                Some(_) => {}
            }
        }

        for path in probe.list_files()? {
            if !self.contains(&path) && !committed.contains(&path) {
                status.untracked.push(path);
            }
        }

        Ok(status)
    }
}

impl TryFrom<Vec<StagingEntry>> for StagingArea {
    type Error = IndexError;

    fn try_from(entries: Vec<StagingEntry>) -> IndexResult<Self> {
        Self::from_entries(entries)
    }
}

impl From<StagingArea> for Vec<StagingEntry> {
    fn from(area: StagingArea) -> Self {
        area.entries
    }
}
