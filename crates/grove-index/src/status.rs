//! Working directory status.

use crate::entry::ChangeKind;

/// Staging compared against the working tree and the committed file set.
///
/// Paths in every list keep staging order, except `untracked`, which follows
/// the probe's listing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkdirStatus {
    pub staged: Vec<(String, ChangeKind)>,
    /// Staged paths whose working copy no longer matches the staged fingerprint.
    pub modified: Vec<String>,
    /// Staged paths missing from the working tree.
    pub deleted: Vec<String>,
    pub untracked: Vec<String>,
}

impl WorkdirStatus {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.untracked.is_empty()
    }

    /// Whether the working tree has drifted from what was staged.
    pub fn has_unstaged_changes(&self) -> bool {
        !self.modified.is_empty() || !self.deleted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_clean() {
        let status = WorkdirStatus::default();
        assert!(status.is_clean());
        assert!(!status.has_unstaged_changes());
    }

    #[test]
    fn untracked_file_alone_makes_status_dirty() {
        let status = WorkdirStatus {
            untracked: vec!["notes.txt".into()],
            ..Default::default()
        };
        assert!(!status.is_clean());
        assert!(!status.has_unstaged_changes());
    }

    #[test]
    fn deleted_counts_as_unstaged_change() {
        let status = WorkdirStatus {
            staged: vec![("a.txt".into(), ChangeKind::Added)],
            deleted: vec!["a.txt".into()],
            ..Default::default()
        };
        assert!(status.has_unstaged_changes());
    }
}
