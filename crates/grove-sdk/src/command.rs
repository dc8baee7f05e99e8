//! Commands accepted by [`Repository::execute`](crate::Repository::execute)
//! and the outcomes they report.

use std::fmt;

use grove_gate::{Contributor, UserGrant};
use grove_index::{ChangeKind, StageOutcome, WorkdirStatus};
use grove_ledger::Commit;
use grove_merge::MergeReport;
use grove_review::{PrId, PullRequest};
use grove_types::CommitId;

/// Path argument of [`Command::Add`] that stages the whole working tree.
pub const ADD_ALL: &str = ".";

/// One repository operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Init,
    /// Stage one file, or every changed file when `path` is `"."`.
    Add { path: String },
    Commit { message: String },
    Log,
    /// Switch to a branch, or rewind to a commit id.
    Checkout { target: String },
    Status,
    Branch(BranchCommand),
    Pr(PrCommand),
    Contributors(ContributorCommand),
    Role(RoleCommand),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BranchCommand {
    List,
    /// Create `name` as a child of the current branch.
    Create { name: String },
    Delete { name: String },
    /// Compare the commits of `source` and `target`. Read-only.
    Merge { source: String, target: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrCommand {
    Create {
        source: String,
        target: String,
        title: Option<String>,
    },
    Status,
    Next,
    Approve { id: PrId },
    Reject { id: PrId },
    Cancel { id: PrId },
    List,
    Clear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContributorCommand {
    List,
    Add { name: String, role: String },
    Remove { name: String },
    Find { name: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleCommand {
    Add {
        user: String,
        role: String,
        permissions: Vec<String>,
    },
    Update {
        user: String,
        role: String,
        permissions: Vec<String>,
    },
    Remove { user: String },
    Show { user: String },
    Check { user: String, action: String },
    List,
}

/// Result of a successful command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Initialized { created: bool },
    /// Files whose staging state changed (or the single file named).
    Staged(Vec<(String, StageOutcome)>),
    Committed(Commit),
    Log {
        commits: Vec<Commit>,
        current: Option<CommitId>,
    },
    SwitchedBranch {
        branch: String,
        commit: Option<CommitId>,
    },
    CheckedOutCommit { commit: CommitId, files: usize },
    Status {
        branch: String,
        commit: Option<CommitId>,
        status: WorkdirStatus,
    },
    /// Indented preorder listing of the branch tree.
    Branches { lines: Vec<String>, current: String },
    BranchCreated { name: String, parent: String },
    BranchDeleted { name: String, orphaned: Vec<String> },
    Merged(MergeReport),
    PrCreated(PullRequest),
    PrStatus(Vec<PullRequest>),
    /// The request moved to review, or `None` when nothing was pending.
    PrAdvanced(Option<PullRequest>),
    PrApproved { pr: PullRequest, commit: Commit },
    PrRejected(PullRequest),
    PrCancelled(PullRequest),
    PrList(Vec<PullRequest>),
    PrCleared(usize),
    Contributors(Vec<Contributor>),
    ContributorAdded(Contributor),
    ContributorRemoved(Contributor),
    ContributorFound {
        name: String,
        contributor: Option<Contributor>,
    },
    RoleAssigned {
        grant: UserGrant,
        previous: Option<String>,
    },
    RoleUpdated { grant: UserGrant, previous: String },
    RoleRemoved { user: String, role: String },
    RoleShown(UserGrant),
    PermissionChecked {
        user: String,
        action: String,
        allowed: bool,
    },
    Roles(Vec<UserGrant>),
}

fn short_or_none(id: Option<CommitId>) -> String {
    id.map(|id| id.short()).unwrap_or_else(|| "none".into())
}

fn stage_label(outcome: StageOutcome) -> &'static str {
    match outcome {
        StageOutcome::Added => "added",
        StageOutcome::Modified => "modified",
        StageOutcome::Unchanged => "unchanged",
    }
}

fn write_commit(f: &mut fmt::Formatter<'_>, commit: &Commit, current: bool) -> fmt::Result {
    let marker = if current { " (current)" } else { "" };
    writeln!(f, "commit {}{marker}", commit.id.full_hex())?;
    writeln!(f, "Author: {}", commit.author)?;
    writeln!(f, "Date:   {}", commit.timestamp)?;
    writeln!(f, "Branch: {}", commit.branch)?;
    writeln!(f, "Parent: {}", short_or_none(commit.parent))?;
    if commit.files.is_empty() {
        writeln!(f, "Files:  (none)")?;
    } else {
        writeln!(f, "Files:  {}", commit.staged_files().join(", "))?;
    }
    write!(f, "\n    {}", commit.message)
}

fn write_pr_line(f: &mut fmt::Formatter<'_>, pr: &PullRequest) -> fmt::Result {
    write!(
        f,
        "#{} [{:<9}] {} -> {} by {} at {}",
        pr.id, pr.status, pr.source, pr.target, pr.author, pr.created_at
    )
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Initialized { created: true } => {
                write!(f, "Initialized empty grove repository")
            }
            Outcome::Initialized { created: false } => {
                write!(f, "Repository already initialized")
            }
            Outcome::Staged(files) if files.is_empty() => write!(f, "Nothing to stage"),
            Outcome::Staged(files) => {
                let lines: Vec<String> = files
                    .iter()
                    .map(|(path, outcome)| format!("{:<10} {path}", format!("{}:", stage_label(*outcome))))
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
            Outcome::Committed(commit) => write!(
                f,
                "[{} {}] {}\n {} file(s) committed",
                commit.branch,
                commit.id,
                commit.message,
                commit.files.len()
            ),
            Outcome::Log { commits, .. } if commits.is_empty() => write!(f, "No commits yet"),
            Outcome::Log { commits, current } => {
                for (i, commit) in commits.iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n\n")?;
                    }
                    write_commit(f, commit, Some(commit.id) == *current)?;
                }
                Ok(())
            }
            Outcome::SwitchedBranch { branch, commit } => write!(
                f,
                "Switched to branch {branch} (commit {})",
                short_or_none(*commit)
            ),
            Outcome::CheckedOutCommit { commit, files } => write!(
                f,
                "Checked out commit {commit}; {files} file(s) restored to staging"
            ),
            Outcome::Status {
                branch,
                commit,
                status,
            } => {
                writeln!(f, "On branch {branch}")?;
                write!(f, "Current commit: {}", short_or_none(*commit))?;
                if status.is_clean() {
                    return write!(f, "\n\nNothing to commit, working tree clean");
                }
                if !status.staged.is_empty() {
                    write!(f, "\n\nChanges to be committed:")?;
                    for (path, kind) in &status.staged {
                        let label = match kind {
                            ChangeKind::Added => "new file:",
                            ChangeKind::Modified => "modified:",
                        };
                        write!(f, "\n  {label:<9} {path}")?;
                    }
                }
                if status.has_unstaged_changes() {
                    write!(f, "\n\nChanges not staged for commit:")?;
                    for path in &status.modified {
                        write!(f, "\n  modified: {path}")?;
                    }
                    for path in &status.deleted {
                        write!(f, "\n  deleted:  {path}")?;
                    }
                }
                if !status.untracked.is_empty() {
                    write!(f, "\n\nUntracked files:")?;
                    for path in &status.untracked {
                        write!(f, "\n  {path}")?;
                    }
                }
                Ok(())
            }
            Outcome::Branches { lines, current } => {
                let rendered: Vec<String> = lines
                    .iter()
                    .map(|line| {
                        let marker = if line.trim_start() == current { '*' } else { ' ' };
                        format!("{marker} {line}")
                    })
                    .collect();
                write!(f, "{}", rendered.join("\n"))
            }
            Outcome::BranchCreated { name, parent } => {
                write!(f, "Created branch {name} under {parent}")
            }
            Outcome::BranchDeleted { name, orphaned } if orphaned.is_empty() => {
                write!(f, "Deleted branch {name}")
            }
            Outcome::BranchDeleted { name, orphaned } => write!(
                f,
                "Deleted branch {name}; orphaned descendants: {}",
                orphaned.join(", ")
            ),
            Outcome::Merged(report) => write!(f, "{}", report.to_string().trim_end()),
            Outcome::PrCreated(pr) => write!(
                f,
                "Created pull request #{} ({} -> {}) with {} file(s)",
                pr.id,
                pr.source,
                pr.target,
                pr.files.len()
            ),
            Outcome::PrStatus(prs) | Outcome::PrList(prs) if prs.is_empty() => {
                write!(f, "No pull requests")
            }
            Outcome::PrStatus(prs) => {
                for (i, pr) in prs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write_pr_line(f, pr)?;
                }
                Ok(())
            }
            Outcome::PrList(prs) => {
                for (i, pr) in prs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write_pr_line(f, pr)?;
                    write!(f, "\n    {}", pr.title)?;
                    if let Some(commit) = pr.merge_commit {
                        write!(f, " (merged as {commit})")?;
                    }
                }
                Ok(())
            }
            Outcome::PrAdvanced(Some(pr)) => {
                write!(f, "Pull request #{} is now {}", pr.id, pr.status)
            }
            Outcome::PrAdvanced(None) => write!(f, "No pending pull requests"),
            Outcome::PrApproved { pr, commit } => write!(
                f,
                "Pull request #{} merged into {} as commit {}",
                pr.id, pr.target, commit.id
            ),
            Outcome::PrRejected(pr) => write!(f, "Pull request #{} rejected", pr.id),
            Outcome::PrCancelled(pr) => write!(f, "Pull request #{} cancelled", pr.id),
            Outcome::PrCleared(count) => write!(f, "Removed {count} pull request(s)"),
            Outcome::Contributors(list) if list.is_empty() => write!(f, "No contributors"),
            Outcome::Contributors(list) => {
                let lines: Vec<String> = list.iter().map(ToString::to_string).collect();
                write!(f, "{}", lines.join("\n"))
            }
            Outcome::ContributorAdded(c) => write!(f, "Added contributor {c}"),
            Outcome::ContributorRemoved(c) => write!(f, "Removed contributor {c}"),
            Outcome::ContributorFound {
                contributor: Some(c),
                ..
            } => write!(f, "Found contributor {c}"),
            Outcome::ContributorFound { name, .. } => write!(f, "Contributor {name} not found"),
            Outcome::RoleAssigned {
                grant,
                previous: Some(previous),
            } => write!(f, "Replaced role {previous}; {grant}"),
            Outcome::RoleAssigned { grant, .. } => write!(f, "Added {grant}"),
            Outcome::RoleUpdated { grant, previous } => {
                write!(f, "Updated from role {previous}; {grant}")
            }
            Outcome::RoleRemoved { user, role } => {
                write!(f, "Removed user {user} (role {role})")
            }
            Outcome::RoleShown(grant) => write!(f, "{grant}"),
            Outcome::PermissionChecked {
                user,
                action,
                allowed,
            } => {
                let verdict = if *allowed { "may" } else { "may not" };
                write!(f, "{user} {verdict} {action}")
            }
            Outcome::Roles(grants) if grants.is_empty() => write!(f, "No users"),
            Outcome::Roles(grants) => {
                let lines: Vec<String> = grants.iter().map(ToString::to_string).collect();
                write!(f, "{}", lines.join("\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_listing_marks_current() {
        let outcome = Outcome::Branches {
            lines: vec!["main".into(), "  feature".into()],
            current: "feature".into(),
        };
        assert_eq!(outcome.to_string(), "  main\n*   feature");
    }

    #[test]
    fn staged_lines_are_aligned() {
        let outcome = Outcome::Staged(vec![
            ("a.txt".into(), StageOutcome::Added),
            ("b.txt".into(), StageOutcome::Modified),
        ]);
        assert_eq!(outcome.to_string(), "added:     a.txt\nmodified:  b.txt");
        assert_eq!(Outcome::Staged(vec![]).to_string(), "Nothing to stage");
    }

    #[test]
    fn permission_check_wording() {
        let outcome = Outcome::PermissionChecked {
            user: "ann".into(),
            action: "merge".into(),
            allowed: false,
        };
        assert_eq!(outcome.to_string(), "ann may not merge");
    }

    #[test]
    fn missing_contributor_is_reported_not_failed() {
        let outcome = Outcome::ContributorFound {
            name: "Zed".into(),
            contributor: None,
        };
        assert_eq!(outcome.to_string(), "Contributor Zed not found");
    }
}
