use std::collections::BTreeMap;
use std::fmt;

use grove_diff::{diff_bytes, render_unified};
use grove_index::FileProbe;
use grove_ledger::Commit;
use grove_types::{CommitId, Fingerprint};

use crate::error::{MergeError, MergeResult};

/// How a path differs between the source and target commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeChange {
    /// Only the source commit records the path.
    Added,
    /// Only the target commit records the path.
    Removed,
    /// Both record it with different fingerprints.
    Modified,
    Unchanged,
}

impl fmt::Display for MergeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.pad("added"),
            Self::Removed => f.pad("removed"),
            Self::Modified => f.pad("modified"),
            Self::Unchanged => f.pad("unchanged"),
        }
    }
}

/// One path in a merge report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMerge {
    pub path: String,
    pub change: MergeChange,
    /// Unified diff, present for added/removed files readable from the
    /// working tree.
    pub diff: Option<String>,
}

/// Comparison of two branches' commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeReport {
    pub source: String,
    pub target: String,
    pub source_commit: CommitId,
    pub target_commit: CommitId,
    /// Every path in either commit, sorted.
    pub files: Vec<FileMerge>,
}

impl MergeReport {
    pub fn count(&self, change: MergeChange) -> usize {
        self.files.iter().filter(|f| f.change == change).count()
    }

    /// Returns `true` if the two commits record identical files.
    pub fn is_noop(&self) -> bool {
        self.files.iter().all(|f| f.change == MergeChange::Unchanged)
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Merge {} ({}) into {} ({}): {} added, {} removed, {} modified, {} unchanged",
            self.source,
            self.source_commit,
            self.target,
            self.target_commit,
            self.count(MergeChange::Added),
            self.count(MergeChange::Removed),
            self.count(MergeChange::Modified),
            self.count(MergeChange::Unchanged),
        )?;
        for file in &self.files {
            writeln!(f, "  {:<9} {}", file.change, file.path)?;
            if let Some(diff) = &file.diff {
                for line in diff.lines() {
                    writeln!(f, "    {line}")?;
                }
            }
        }
        Ok(())
    }
}

/// Compare the commits associated with `source` and `target`.
///
/// Both branches must have a commit. Only [`MergeChange::Added`] and
/// [`MergeChange::Removed`] entries carry a diff, since the prior content of a
/// modified file is not stored anywhere.
pub fn build_merge_report(
    source: &str,
    source_commit: Option<&Commit>,
    target: &str,
    target_commit: Option<&Commit>,
    probe: &dyn FileProbe,
) -> MergeResult<MergeReport> {
    let source_commit = source_commit.ok_or_else(|| MergeError::MissingCommit {
        branch: source.to_string(),
    })?;
    let target_commit = target_commit.ok_or_else(|| MergeError::MissingCommit {
        branch: target.to_string(),
    })?;

    let mut sides: BTreeMap<&str, (Option<Fingerprint>, Option<Fingerprint>)> = BTreeMap::new();
    for file in &source_commit.files {
        sides.entry(file.path.as_str()).or_default().0 = Some(file.fingerprint);
    }
    for file in &target_commit.files {
        sides.entry(file.path.as_str()).or_default().1 = Some(file.fingerprint);
    }

    let files = sides
        .into_iter()
        .map(|(path, sides)| {
            let change = match sides {
                (Some(_), None) => MergeChange::Added,
                (None, Some(_)) => MergeChange::Removed,
                (Some(a), Some(b)) if a != b => MergeChange::Modified,
                _ => MergeChange::Unchanged,
            };
            let diff = match change {
                MergeChange::Added | MergeChange::Removed => file_diff(probe, path, change),
                MergeChange::Modified | MergeChange::Unchanged => None,
            };
            FileMerge {
                path: path.to_string(),
                change,
                diff,
            }
        })
        .collect();

    let report = MergeReport {
        source: source.to_string(),
        target: target.to_string(),
        source_commit: source_commit.id,
        target_commit: target_commit.id,
        files,
    };
    tracing::debug!(
        source,
        target,
        files = report.files.len(),
        "built merge report"
    );
    Ok(report)
}

fn file_diff(probe: &dyn FileProbe, path: &str, change: MergeChange) -> Option<String> {
    let content = match probe.read(path) {
        Ok(Some(content)) => content,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(path, error = %e, "cannot read file for merge diff");
            return None;
        }
    };
    let (diff, old_label, new_label) = if change == MergeChange::Added {
        (diff_bytes(&[], &content), "/dev/null".to_string(), format!("b/{path}"))
    } else {
        (diff_bytes(&content, &[]), format!("a/{path}"), "/dev/null".to_string())
    };
    Some(render_unified(&diff, &old_label, &new_label))
}
