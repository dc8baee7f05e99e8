use std::path::Path;
use std::sync::Arc;

use grove_gate::{Contributor, ContributorDirectory, PermissionRegistry};
use grove_index::{FileProbe, StagingArea, WorkdirProbe};
use grove_ledger::{Commit, CommitChain, CommitFile, LedgerError};
use grove_merge::build_merge_report;
use grove_refs::{BranchTree, RefError, MAIN_BRANCH};
use grove_review::{NewPullRequest, PrId, PullRequestQueue};
use grove_store::{
    load_record, save_record, FileRecordStore, ObjectIndex, RecordKind, RecordStore, StoreError,
};
use grove_types::{Clock, CommitId, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::command::{
    BranchCommand, Command, ContributorCommand, Outcome, PrCommand, RoleCommand, ADD_ALL,
};
use crate::config::RepoConfig;
use crate::error::{SdkError, SdkResult};

/// The checked-out branch and commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRecord {
    pub current_branch: String,
    pub current_commit: Option<CommitId>,
}

impl Default for HeadRecord {
    fn default() -> Self {
        Self {
            current_branch: MAIN_BRANCH.to_string(),
            current_commit: None,
        }
    }
}

/// A repository session.
///
/// All records are read when the session opens. Each command mutates the
/// in-memory structures and then rewrites the records it touched.
pub struct Repository {
    label: String,
    records: Arc<dyn RecordStore>,
    probe: Arc<dyn FileProbe>,
    clock: Arc<dyn Clock>,
    config: RepoConfig,
    initialized: bool,
    chain: CommitChain,
    objects: ObjectIndex,
    branches: BranchTree,
    staging: StagingArea,
    queue: PullRequestQueue,
    contributors: ContributorDirectory,
    registry: PermissionRegistry,
    head: HeadRecord,
}

impl Repository {
    /// Open the repository rooted at `root`, backed by files under
    /// `<root>/.grove` and the system clock.
    pub fn open_dir(root: impl AsRef<Path>) -> SdkResult<Self> {
        let root = root.as_ref();
        let records = FileRecordStore::new(root);
        let config = RepoConfig::load(&records.repo_dir())?;
        Self::with_backends(
            root.display().to_string(),
            Arc::new(records),
            Arc::new(WorkdirProbe::new(root)),
            Arc::new(SystemClock),
            config,
        )
    }

    /// Open a repository over explicit backends.
    pub fn with_backends(
        label: impl Into<String>,
        records: Arc<dyn RecordStore>,
        probe: Arc<dyn FileProbe>,
        clock: Arc<dyn Clock>,
        config: RepoConfig,
    ) -> SdkResult<Self> {
        config.validate()?;
        let objects = ObjectIndex::with_min_degree(config.btree_min_degree)?;
        let mut repo = Self {
            label: label.into(),
            records,
            probe,
            clock,
            config,
            initialized: false,
            chain: CommitChain::new(),
            objects,
            branches: BranchTree::new(),
            staging: StagingArea::new(),
            queue: PullRequestQueue::new(),
            contributors: ContributorDirectory::new(),
            registry: PermissionRegistry::new(),
            head: HeadRecord::default(),
        };
        if repo.records.is_initialized()? {
            repo.load()?;
        }
        Ok(repo)
    }

    fn load(&mut self) -> SdkResult<()> {
        let store = self.records.as_ref();
        self.chain = load_record(store, RecordKind::Commits)?.unwrap_or_default();
        self.branches = load_record(store, RecordKind::Branches)?.unwrap_or_default();
        self.staging = load_record(store, RecordKind::Staging)?.unwrap_or_default();
        self.queue = load_record(store, RecordKind::PullRequests)?.unwrap_or_default();
        self.contributors = load_record(store, RecordKind::Contributors)?.unwrap_or_default();
        self.registry = load_record(store, RecordKind::Roles)?.unwrap_or_default();
        self.head = load_record(store, RecordKind::Head)?.unwrap_or_default();
        self.check_head()?;

        let mut objects = ObjectIndex::with_min_degree(self.config.btree_min_degree)?;
        objects.extend(self.chain.fingerprints());
        self.objects = objects;
        self.initialized = true;
        debug!(
            repo = %self.label,
            commits = self.chain.len(),
            branches = self.branches.len(),
            objects = self.objects.len(),
            "loaded repository"
        );
        Ok(())
    }

    fn check_head(&self) -> SdkResult<()> {
        let reason = if !self.branches.contains(&self.head.current_branch) {
            format!("current branch {} does not exist", self.head.current_branch)
        } else if let Some(id) = self.head.current_commit.filter(|id| !self.chain.contains(id)) {
            format!("current commit {id} is not in history")
        } else {
            return Ok(());
        };
        Err(StoreError::Serialization {
            kind: RecordKind::Head,
            reason,
        }
        .into())
    }

    /// Rewrite the given records from the in-memory state.
    fn save(&self, kinds: &[RecordKind]) -> SdkResult<()> {
        let store = self.records.as_ref();
        for &kind in kinds {
            match kind {
                RecordKind::Commits => save_record(store, kind, &self.chain)?,
                RecordKind::PullRequests => save_record(store, kind, &self.queue)?,
                RecordKind::Branches => save_record(store, kind, &self.branches)?,
                RecordKind::Contributors => save_record(store, kind, &self.contributors)?,
                RecordKind::Staging => save_record(store, kind, &self.staging)?,
                RecordKind::Head => save_record(store, kind, &self.head)?,
                RecordKind::Roles => save_record(store, kind, &self.registry)?,
            }
        }
        Ok(())
    }

    /// Structural self-check, run after every command in debug builds.
    fn check_structures(&self) -> SdkResult<()> {
        if cfg!(debug_assertions) {
            self.objects.validate()?;
            self.chain.validate()?;
            self.branches.validate()?;
            self.contributors.validate()?;
            self.registry.validate()?;
        }
        Ok(())
    }

    fn require_initialized(&self) -> SdkResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(SdkError::NotInitialized(self.label.clone()))
        }
    }

    // ---- Accessors ----

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Record `author` on subsequent commits and pull requests.
    pub fn set_author(&mut self, author: impl Into<String>) -> SdkResult<()> {
        let author = author.into();
        if author.trim().is_empty() {
            return Err(SdkError::Config("author must not be empty".into()));
        }
        self.config.author = author;
        Ok(())
    }

    pub fn head(&self) -> &HeadRecord {
        &self.head
    }

    pub fn chain(&self) -> &CommitChain {
        &self.chain
    }

    pub fn objects(&self) -> &ObjectIndex {
        &self.objects
    }

    pub fn branches(&self) -> &BranchTree {
        &self.branches
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn pull_requests(&self) -> &PullRequestQueue {
        &self.queue
    }

    pub fn contributors(&self) -> &ContributorDirectory {
        &self.contributors
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    // ---- Dispatch ----

    /// Run one command.
    ///
    /// Every command except [`Command::Init`] requires an initialized
    /// repository. A failed command leaves the structures unchanged.
    pub fn execute(&mut self, command: Command) -> SdkResult<Outcome> {
        if command != Command::Init {
            self.require_initialized()?;
        }
        let outcome = match command {
            Command::Init => self.init(),
            Command::Add { path } => self.add(&path),
            Command::Commit { message } => self.commit(message),
            Command::Log => Ok(self.log()),
            Command::Checkout { target } => self.checkout(target),
            Command::Status => self.status(),
            Command::Branch(cmd) => self.branch(cmd),
            Command::Pr(cmd) => self.pull_request(cmd),
            Command::Contributors(cmd) => self.contributor(cmd),
            Command::Role(cmd) => self.role(cmd),
        }?;
        self.check_structures()?;
        Ok(outcome)
    }

    // ---- Repository operations ----

    fn init(&mut self) -> SdkResult<Outcome> {
        let created = self.records.initialize()?;
        if created {
            self.initialized = true;
            self.save(&RecordKind::ALL)?;
            info!(repo = %self.label, "initialized repository");
        } else if !self.initialized {
            self.load()?;
        }
        Ok(Outcome::Initialized { created })
    }

    fn add(&mut self, path: &str) -> SdkResult<Outcome> {
        let staged = if path == ADD_ALL {
            self.staging.stage_all(self.probe.as_ref())?
        } else {
            vec![self.staging.stage_from(self.probe.as_ref(), path)?]
        };
        if staged.iter().any(|(_, outcome)| outcome.changed()) {
            self.save(&[RecordKind::Staging])?;
        }
        Ok(Outcome::Staged(staged))
    }

    fn commit(&mut self, message: String) -> SdkResult<Outcome> {
        if message.trim().is_empty() {
            return Err(SdkError::InvalidOperation(
                "commit message must not be empty".into(),
            ));
        }
        if self.staging.is_empty() {
            return Err(SdkError::EmptyStaging);
        }
        let files = self
            .staging
            .entries()
            .iter()
            .map(|entry| CommitFile::new(&entry.path, entry.fingerprint))
            .collect();
        let author = self.config.author.clone();
        let branch = self.head.current_branch.clone();
        let commit = self.record_commit(message, author, files, branch)?;
        self.save(&[
            RecordKind::Commits,
            RecordKind::Staging,
            RecordKind::Head,
            RecordKind::Branches,
        ])?;
        Ok(Outcome::Committed(commit))
    }

    /// Append a commit of `files` on `branch` and update everything that
    /// refers to history: the object index, staging, the branch's commit and,
    /// when `branch` is checked out, the current commit.
    ///
    /// The chain rejects redundant commits before anything changes.
    fn record_commit(
        &mut self,
        message: String,
        author: String,
        files: Vec<CommitFile>,
        branch: String,
    ) -> SdkResult<Commit> {
        let commit = Commit::new(
            message,
            author,
            files,
            self.chain.tail_id(),
            branch,
            self.clock.now(),
        );
        let commit = self.chain.append(commit)?.clone();
        for file in &commit.files {
            self.objects.insert(file.fingerprint);
        }
        self.staging.clear();
        if self.branches.contains(&commit.branch) {
            self.branches.set_commit(&commit.branch, commit.id)?;
        }
        if commit.branch == self.head.current_branch {
            self.head.current_commit = Some(commit.id);
        }
        info!(
            id = %commit.id,
            branch = %commit.branch,
            files = commit.files.len(),
            "created commit"
        );
        Ok(commit)
    }

    fn log(&self) -> Outcome {
        Outcome::Log {
            commits: self.chain.iter().cloned().collect(),
            current: self.head.current_commit,
        }
    }

    fn checkout(&mut self, target: String) -> SdkResult<Outcome> {
        if let Some(node) = self.branches.find(&target) {
            if let Some(commit) = node.commit() {
                self.head.current_commit = Some(commit);
            }
            self.head.current_branch = target.clone();
            self.save(&[RecordKind::Head])?;
            debug!(branch = %target, "switched branch");
            return Ok(Outcome::SwitchedBranch {
                branch: target,
                commit: self.head.current_commit,
            });
        }

        let commit = match self.chain.resolve(&target) {
            Ok(commit) => commit,
            Err(LedgerError::CommitNotFound(_)) => return Err(SdkError::UnknownTarget(target)),
            Err(e) => return Err(e.into()),
        };
        self.staging.replace_with(
            commit
                .files
                .iter()
                .map(|file| (file.path.clone(), file.fingerprint)),
        );
        self.head.current_commit = Some(commit.id);
        let outcome = Outcome::CheckedOutCommit {
            commit: commit.id,
            files: self.staging.len(),
        };
        self.save(&[RecordKind::Head, RecordKind::Staging])?;
        Ok(outcome)
    }

    fn status(&self) -> SdkResult<Outcome> {
        let committed = self.chain.committed_paths();
        let status = self.staging.status(self.probe.as_ref(), &committed)?;
        Ok(Outcome::Status {
            branch: self.head.current_branch.clone(),
            commit: self.head.current_commit,
            status,
        })
    }

    // ---- Branch operations ----

    fn branch(&mut self, cmd: BranchCommand) -> SdkResult<Outcome> {
        match cmd {
            BranchCommand::List => Ok(Outcome::Branches {
                lines: self.branches.list_preorder(),
                current: self.head.current_branch.clone(),
            }),
            BranchCommand::Create { name } => {
                let parent = self.head.current_branch.clone();
                self.branches.add_branch(&parent, &name)?;
                self.save(&[RecordKind::Branches])?;
                Ok(Outcome::BranchCreated { name, parent })
            }
            BranchCommand::Delete { name } => {
                let current = &self.head.current_branch;
                if name != MAIN_BRANCH && self.branches.subtree_contains(&name, current) {
                    return Err(RefError::DeleteCurrentBranch {
                        name,
                        current: current.clone(),
                    }
                    .into());
                }
                let orphaned = self.branches.delete_branch(&name)?;
                self.save(&[RecordKind::Branches])?;
                Ok(Outcome::BranchDeleted { name, orphaned })
            }
            BranchCommand::Merge { source, target } => {
                let source_commit = self.branch_commit(&source)?;
                let target_commit = self.branch_commit(&target)?;
                let report = build_merge_report(
                    &source,
                    source_commit,
                    &target,
                    target_commit,
                    self.probe.as_ref(),
                )?;
                Ok(Outcome::Merged(report))
            }
        }
    }

    /// The commit associated with branch `name`, if it has one.
    fn branch_commit(&self, name: &str) -> SdkResult<Option<&Commit>> {
        let node = self.branches.find(name).ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })?;
        Ok(node.commit().and_then(|id| self.chain.get(&id)))
    }

    // ---- Pull request operations ----

    fn pull_request(&mut self, cmd: PrCommand) -> SdkResult<Outcome> {
        match cmd {
            PrCommand::Create {
                source,
                target,
                title,
            } => {
                for name in [&source, &target] {
                    if !self.branches.contains(name) {
                        return Err(RefError::NotFound { name: name.clone() }.into());
                    }
                }
                let request = NewPullRequest {
                    source,
                    target,
                    title,
                    author: self.config.author.clone(),
                    files: self.staging.snapshot(),
                };
                let pr = self.queue.create(request, self.clock.now())?.clone();
                self.save(&[RecordKind::PullRequests])?;
                Ok(Outcome::PrCreated(pr))
            }
            PrCommand::Status => Ok(Outcome::PrStatus(self.queue.iter().cloned().collect())),
            PrCommand::List => Ok(Outcome::PrList(self.queue.iter().cloned().collect())),
            PrCommand::Next => {
                let advanced = self.queue.advance_next()?.cloned();
                if advanced.is_some() {
                    self.save(&[RecordKind::PullRequests])?;
                }
                Ok(Outcome::PrAdvanced(advanced))
            }
            PrCommand::Approve { id } => self.approve(id),
            PrCommand::Reject { id } => {
                let pr = self.queue.reject(id, self.clock.now())?.clone();
                self.save(&[RecordKind::PullRequests])?;
                Ok(Outcome::PrRejected(pr))
            }
            PrCommand::Cancel { id } => {
                let pr = self.queue.cancel(id, self.clock.now())?;
                self.save(&[RecordKind::PullRequests])?;
                Ok(Outcome::PrCancelled(pr))
            }
            PrCommand::Clear => {
                let count = self.queue.clear();
                self.save(&[RecordKind::PullRequests])?;
                Ok(Outcome::PrCleared(count))
            }
        }
    }

    /// Merge a `reviewing` request: its captured files become a merge commit
    /// on the target branch.
    fn approve(&mut self, id: PrId) -> SdkResult<Outcome> {
        let pr = self.queue.approvable(id)?;
        let message = format!("Merge PR #{}: {} -> {}", pr.id, pr.source, pr.target);
        let files = pr
            .files
            .iter()
            .map(|entry| CommitFile::new(&entry.path, entry.fingerprint))
            .collect();
        let target = pr.target.clone();
        let author = self.config.merge_author.clone();

        let commit = self.record_commit(message, author, files, target)?;
        let pr = self
            .queue
            .mark_merged(id, commit.id, commit.timestamp)?
            .clone();
        info!(pr = id, commit = %commit.id, target = %pr.target, "merged pull request");
        self.save(&[
            RecordKind::Commits,
            RecordKind::PullRequests,
            RecordKind::Staging,
            RecordKind::Head,
            RecordKind::Branches,
        ])?;
        Ok(Outcome::PrApproved { pr, commit })
    }

    // ---- Contributor operations ----

    fn contributor(&mut self, cmd: ContributorCommand) -> SdkResult<Outcome> {
        match cmd {
            ContributorCommand::List => Ok(Outcome::Contributors(
                self.contributors.iter().cloned().collect(),
            )),
            ContributorCommand::Add { name, role } => {
                self.contributors.insert(&name, &role)?;
                self.save(&[RecordKind::Contributors])?;
                Ok(Outcome::ContributorAdded(Contributor { name, role }))
            }
            ContributorCommand::Remove { name } => {
                let removed = self.contributors.delete(&name)?;
                self.save(&[RecordKind::Contributors])?;
                Ok(Outcome::ContributorRemoved(removed))
            }
            ContributorCommand::Find { name } => {
                let contributor = self.contributors.find(&name).cloned();
                Ok(Outcome::ContributorFound { name, contributor })
            }
        }
    }

    // ---- Role operations ----

    fn role(&mut self, cmd: RoleCommand) -> SdkResult<Outcome> {
        match cmd {
            RoleCommand::Add {
                user,
                role,
                permissions,
            } => {
                let previous = self.registry.insert(&user, &role, permissions)?;
                self.save(&[RecordKind::Roles])?;
                Ok(Outcome::RoleAssigned {
                    grant: self.registry.show(&user)?,
                    previous,
                })
            }
            RoleCommand::Update {
                user,
                role,
                permissions,
            } => {
                let previous = self.registry.update(&user, &role, permissions)?;
                self.save(&[RecordKind::Roles])?;
                Ok(Outcome::RoleUpdated {
                    grant: self.registry.show(&user)?,
                    previous,
                })
            }
            RoleCommand::Remove { user } => {
                let role = self.registry.remove(&user)?;
                self.save(&[RecordKind::Roles])?;
                Ok(Outcome::RoleRemoved { user, role })
            }
            RoleCommand::Show { user } => Ok(Outcome::RoleShown(self.registry.show(&user)?)),
            RoleCommand::Check { user, action } => {
                let allowed = self.registry.check_permission(&user, &action);
                Ok(Outcome::PermissionChecked {
                    user,
                    action,
                    allowed,
                })
            }
            RoleCommand::List => Ok(Outcome::Roles(self.registry.list_users())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use grove_crypto::ContentHasher;
    use grove_index::{ChangeKind, InMemoryWorkdir, StageOutcome};
    use grove_review::PrStatus;
    use grove_store::InMemoryRecordStore;
    use grove_types::ManualClock;
    use proptest::prelude::*;

    struct Fixture {
        records: Arc<InMemoryRecordStore>,
        workdir: Arc<InMemoryWorkdir>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                records: Arc::new(InMemoryRecordStore::new()),
                workdir: Arc::new(InMemoryWorkdir::new()),
                clock: Arc::new(ManualClock::default()),
            }
        }

        fn open(&self) -> Repository {
            let config = RepoConfig {
                btree_min_degree: 2,
                ..RepoConfig::default()
            };
            Repository::with_backends(
                "memory",
                self.records.clone(),
                self.workdir.clone(),
                self.clock.clone(),
                config,
            )
            .unwrap()
        }

        fn init(&self) -> Repository {
            let mut repo = self.open();
            repo.execute(Command::Init).unwrap();
            repo
        }
    }

    fn add(path: &str) -> Command {
        Command::Add { path: path.into() }
    }

    fn commit(message: &str) -> Command {
        Command::Commit {
            message: message.into(),
        }
    }

    fn branch(cmd: BranchCommand) -> Command {
        Command::Branch(cmd)
    }

    fn create_branch(name: &str) -> Command {
        branch(BranchCommand::Create { name: name.into() })
    }

    fn pr_create(source: &str, target: &str) -> Command {
        Command::Pr(PrCommand::Create {
            source: source.into(),
            target: target.into(),
            title: None,
        })
    }

    fn contributor_add(name: &str, role: &str) -> Command {
        Command::Contributors(ContributorCommand::Add {
            name: name.into(),
            role: role.into(),
        })
    }

    #[test]
    fn commands_before_init_are_preconditions() {
        let fx = Fixture::new();
        let mut repo = fx.open();
        assert!(!repo.is_initialized());
        for cmd in [add("."), commit("x"), Command::Log, Command::Status] {
            let err = repo.execute(cmd).unwrap_err();
            assert!(matches!(err, SdkError::NotInitialized(_)));
            assert_eq!(err.kind(), ErrorKind::Precondition);
        }
    }

    #[test]
    fn init_is_idempotent() {
        let fx = Fixture::new();
        let mut repo = fx.open();
        assert_eq!(
            repo.execute(Command::Init).unwrap(),
            Outcome::Initialized { created: true }
        );
        assert_eq!(
            repo.execute(Command::Init).unwrap(),
            Outcome::Initialized { created: false }
        );
        assert_eq!(repo.head().current_branch, MAIN_BRANCH);
        assert_eq!(fx.records.len(), RecordKind::ALL.len());
    }

    #[test]
    fn add_missing_file_is_not_found() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        let err = repo.execute(add("nope.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(repo.staging().is_empty());
    }

    #[test]
    fn restaging_unchanged_file_is_idempotent() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "one");
        let mut repo = fx.init();
        repo.execute(add("a.txt")).unwrap();
        let before = repo.staging().clone();
        let outcome = repo.execute(add("a.txt")).unwrap();
        assert_eq!(
            outcome,
            Outcome::Staged(vec![("a.txt".into(), StageOutcome::Unchanged)])
        );
        assert_eq!(repo.staging(), &before);

        fx.workdir.write("a.txt", "two");
        repo.execute(add("a.txt")).unwrap();
        let entry = repo.staging().get("a.txt").unwrap();
        assert_eq!(entry.kind, ChangeKind::Modified);
        assert_eq!(entry.fingerprint, ContentHasher::BLOB.hash(b"two"));
    }

    #[test]
    fn add_all_reports_only_changes() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "a");
        fx.workdir.write("src/b.rs", "b");
        let mut repo = fx.init();
        repo.execute(add("a.txt")).unwrap();
        let outcome = repo.execute(add(".")).unwrap();
        assert_eq!(
            outcome,
            Outcome::Staged(vec![("src/b.rs".into(), StageOutcome::Added)])
        );
        assert_eq!(repo.staging().len(), 2);
    }

    #[test]
    fn commit_requires_staged_files() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        let err = repo.execute(commit("empty")).unwrap_err();
        assert!(matches!(err, SdkError::EmptyStaging));
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn commit_feeds_chain_index_branch_and_head() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "hello");
        let mut repo = fx.init();
        repo.execute(add("a.txt")).unwrap();
        let Outcome::Committed(c) = repo.execute(commit("init")).unwrap() else {
            panic!("expected a commit");
        };
        assert_eq!(c.author, "user@grove.local");
        assert_eq!(c.branch, MAIN_BRANCH);
        assert_eq!(c.parent, None);
        assert_eq!(repo.chain().len(), 1);
        assert!(repo.objects().search(&ContentHasher::BLOB.hash(b"hello")));
        assert!(repo.staging().is_empty());
        assert_eq!(repo.head().current_commit, Some(c.id));
        assert_eq!(repo.branches().root().commit(), Some(c.id));
    }

    #[test]
    fn redundant_commit_is_a_conflict() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "hello");
        let mut repo = fx.init();
        repo.execute(add("a.txt")).unwrap();
        repo.execute(commit("init")).unwrap();

        repo.execute(add("a.txt")).unwrap();
        let err = repo.execute(commit("init")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(repo.chain().len(), 1);
        assert_eq!(repo.staging().len(), 1);
    }

    #[test]
    fn second_commit_links_to_tail() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "1");
        let mut repo = fx.init();
        repo.execute(add("a.txt")).unwrap();
        repo.execute(commit("first")).unwrap();
        fx.workdir.write("a.txt", "2");
        repo.execute(add("a.txt")).unwrap();
        repo.execute(commit("second")).unwrap();

        let ids: Vec<_> = repo.chain().iter().map(|c| c.id).collect();
        assert_eq!(repo.chain().get(&ids[1]).unwrap().parent, Some(ids[0]));
        assert_eq!(repo.objects().len(), 2);
    }

    #[test]
    fn log_marks_current_commit() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "1");
        let mut repo = fx.init();
        assert_eq!(repo.execute(Command::Log).unwrap().to_string(), "No commits yet");
        repo.execute(add("a.txt")).unwrap();
        repo.execute(commit("first")).unwrap();
        let text = repo.execute(Command::Log).unwrap().to_string();
        assert!(text.contains("(current)"));
        assert!(text.contains("Files:  a.txt"));
        assert!(text.contains("    first"));
    }

    #[test]
    fn checkout_commit_restores_staging() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "1");
        fx.workdir.write("b.txt", "1");
        let mut repo = fx.init();
        repo.execute(add(".")).unwrap();
        repo.execute(commit("first")).unwrap();
        let first = repo.chain().tail_id().unwrap();
        fx.workdir.write("c.txt", "1");
        repo.execute(add("c.txt")).unwrap();
        repo.execute(commit("second")).unwrap();

        let outcome = repo
            .execute(Command::Checkout {
                target: first.short(),
            })
            .unwrap();
        assert_eq!(outcome, Outcome::CheckedOutCommit { commit: first, files: 2 });
        assert_eq!(repo.head().current_commit, Some(first));
        assert_eq!(repo.staging().staged_files(), vec!["a.txt", "b.txt"]);
        assert!(repo
            .staging()
            .entries()
            .iter()
            .all(|e| e.kind == ChangeKind::Added));
    }

    #[test]
    fn checkout_branch_moves_current_commit_only() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "1");
        let mut repo = fx.init();
        repo.execute(add("a.txt")).unwrap();
        repo.execute(commit("first")).unwrap();
        let first = repo.chain().tail_id();
        repo.execute(create_branch("feature")).unwrap();
        fx.workdir.write("b.txt", "1");
        repo.execute(add("b.txt")).unwrap();

        let outcome = repo
            .execute(Command::Checkout {
                target: "feature".into(),
            })
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::SwitchedBranch {
                branch: "feature".into(),
                commit: first
            }
        );
        assert_eq!(repo.staging().staged_files(), vec!["b.txt"]);
    }

    #[test]
    fn checkout_unknown_target_is_not_found() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        for target in ["nowhere", "abcdef"] {
            let err = repo
                .execute(Command::Checkout {
                    target: target.into(),
                })
                .unwrap_err();
            assert!(matches!(err, SdkError::UnknownTarget(_)));
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn status_reports_each_category() {
        let fx = Fixture::new();
        fx.workdir.write("kept.txt", "k");
        fx.workdir.write("edited.txt", "1");
        fx.workdir.write("gone.txt", "g");
        let mut repo = fx.init();
        repo.execute(add("kept.txt")).unwrap();
        repo.execute(commit("kept")).unwrap();
        repo.execute(add("edited.txt")).unwrap();
        repo.execute(add("gone.txt")).unwrap();
        fx.workdir.write("edited.txt", "2");
        fx.workdir.remove("gone.txt");
        fx.workdir.write("new.txt", "n");

        let Outcome::Status { status, .. } = repo.execute(Command::Status).unwrap() else {
            panic!("expected status");
        };
        assert_eq!(status.staged.len(), 2);
        assert_eq!(status.modified.len(), 1);
        assert_eq!(status.deleted, vec!["gone.txt".to_string()]);
        assert_eq!(status.untracked, vec!["new.txt".to_string()]);
    }

    #[test]
    fn branch_scenario_protects_main() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(create_branch("feature")).unwrap();

        let err = repo
            .execute(branch(BranchCommand::Delete { name: "main".into() }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        repo.execute(branch(BranchCommand::Delete {
            name: "feature".into(),
        }))
        .unwrap();
        let listing = repo.execute(branch(BranchCommand::List)).unwrap().to_string();
        assert!(!listing.contains("feature"));
        assert_eq!(listing, "* main");
    }

    #[test]
    fn cannot_delete_branch_containing_current() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(create_branch("dev")).unwrap();
        repo.execute(Command::Checkout {
            target: "dev".into(),
        })
        .unwrap();
        repo.execute(create_branch("topic")).unwrap();
        repo.execute(Command::Checkout {
            target: "topic".into(),
        })
        .unwrap();

        for name in ["dev", "topic"] {
            let err = repo
                .execute(branch(BranchCommand::Delete { name: name.into() }))
                .unwrap_err();
            assert!(matches!(
                err,
                SdkError::Ref(RefError::DeleteCurrentBranch { .. })
            ));
        }

        repo.execute(Command::Checkout {
            target: "main".into(),
        })
        .unwrap();
        let outcome = repo
            .execute(branch(BranchCommand::Delete { name: "dev".into() }))
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::BranchDeleted {
                name: "dev".into(),
                orphaned: vec!["topic".into()]
            }
        );
        assert!(!repo.branches().contains("topic"));
    }

    #[test]
    fn duplicate_and_invalid_branch_names() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(create_branch("feature")).unwrap();
        let err = repo.execute(create_branch("feature")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = repo.execute(create_branch("bad name")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn branch_merge_compares_commits() {
        let fx = Fixture::new();
        fx.workdir.write("shared.txt", "s");
        let mut repo = fx.init();
        repo.execute(add("shared.txt")).unwrap();
        repo.execute(commit("base")).unwrap();
        repo.execute(create_branch("feature")).unwrap();

        let err = repo
            .execute(branch(BranchCommand::Merge {
                source: "feature".into(),
                target: "ghost".into(),
            }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        repo.execute(Command::Checkout {
            target: "feature".into(),
        })
        .unwrap();
        fx.workdir.write("extra.txt", "line\n");
        repo.execute(add("shared.txt")).unwrap();
        repo.execute(add("extra.txt")).unwrap();
        repo.execute(commit("feature work")).unwrap();

        let Outcome::Merged(report) = repo
            .execute(branch(BranchCommand::Merge {
                source: "feature".into(),
                target: "main".into(),
            }))
            .unwrap()
        else {
            panic!("expected a merge report");
        };
        assert_eq!(report.count(grove_merge::MergeChange::Added), 1);
        assert_eq!(report.count(grove_merge::MergeChange::Unchanged), 1);
        let added = report.files.iter().find(|f| f.path == "extra.txt").unwrap();
        assert!(added.diff.as_deref().unwrap().contains("+line"));
    }

    #[test]
    fn merge_requires_commits_on_both_branches() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(create_branch("feature")).unwrap();
        let err = repo
            .execute(branch(BranchCommand::Merge {
                source: "feature".into(),
                target: "main".into(),
            }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn pull_request_scenario_merges_into_history() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "a");
        let mut repo = fx.init();
        repo.execute(add("a.txt")).unwrap();
        repo.execute(commit("init")).unwrap();
        let tail = repo.chain().tail_id();
        repo.execute(create_branch("feature")).unwrap();
        fx.workdir.write("f.txt", "f");
        repo.execute(add("f.txt")).unwrap();

        let Outcome::PrCreated(pr) = repo.execute(pr_create("feature", "main")).unwrap() else {
            panic!("expected a pull request");
        };
        assert_eq!(pr.id, 1);
        assert_eq!(pr.status, PrStatus::Pending);
        assert_eq!(pr.file_names(), vec!["f.txt"]);

        let Outcome::PrAdvanced(Some(pr)) = repo.execute(Command::Pr(PrCommand::Next)).unwrap()
        else {
            panic!("expected an advanced request");
        };
        assert_eq!(pr.status, PrStatus::Reviewing);

        let Outcome::PrApproved { pr, commit } = repo
            .execute(Command::Pr(PrCommand::Approve { id: 1 }))
            .unwrap()
        else {
            panic!("expected an approval");
        };
        assert_eq!(commit.parent, tail);
        assert_eq!(commit.message, "Merge PR #1: feature -> main");
        assert_eq!(commit.author, "system@merge");
        assert_eq!(commit.branch, "main");
        assert_eq!(pr.status, PrStatus::Merged);
        assert_eq!(pr.merged_at, Some(commit.timestamp));
        assert_eq!(pr.merge_commit, Some(commit.id));
        assert_eq!(repo.chain().len(), 2);
        assert!(repo.staging().is_empty());
        assert!(repo.objects().search(&ContentHasher::BLOB.hash(b"f")));
        assert_eq!(repo.branches().root().commit(), Some(commit.id));
    }

    #[test]
    fn approve_requires_reviewing() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(create_branch("feature")).unwrap();
        repo.execute(pr_create("feature", "main")).unwrap();
        let err = repo
            .execute(Command::Pr(PrCommand::Approve { id: 1 }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(repo.chain().is_empty());
        let err = repo
            .execute(Command::Pr(PrCommand::Approve { id: 9 }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn redundant_merge_leaves_request_reviewing() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(create_branch("feature")).unwrap();
        fx.workdir.write("f.txt", "f");
        repo.execute(add("f.txt")).unwrap();
        // A hand-written commit that records exactly what the merge would.
        repo.execute(commit("Merge PR #1: feature -> main")).unwrap();

        repo.execute(add("f.txt")).unwrap();
        repo.execute(pr_create("feature", "main")).unwrap();
        repo.execute(Command::Pr(PrCommand::Next)).unwrap();
        let err = repo
            .execute(Command::Pr(PrCommand::Approve { id: 1 }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(repo.pull_requests().get(1).unwrap().status, PrStatus::Reviewing);
        assert_eq!(repo.chain().len(), 1);
        assert_eq!(repo.staging().len(), 1);
    }

    #[test]
    fn requests_after_clear_get_fresh_ids_and_merge() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        fx.workdir.write("a.txt", "a");
        repo.execute(add("a.txt")).unwrap();
        repo.execute(commit("first")).unwrap();
        repo.execute(create_branch("feature")).unwrap();

        for expected_id in [1, 2] {
            let Outcome::PrCreated(pr) = repo.execute(pr_create("feature", "main")).unwrap()
            else {
                panic!("expected a pull request");
            };
            assert_eq!(pr.id, expected_id);
            repo.execute(Command::Pr(PrCommand::Next)).unwrap();
            let Outcome::PrApproved { commit, .. } = repo
                .execute(Command::Pr(PrCommand::Approve { id: expected_id }))
                .unwrap()
            else {
                panic!("expected an approval");
            };
            assert_eq!(
                commit.message,
                format!("Merge PR #{expected_id}: feature -> main")
            );
            repo.execute(Command::Pr(PrCommand::Clear)).unwrap();
        }
        assert_eq!(repo.chain().len(), 3);

        let reopened = fx.open();
        assert_eq!(reopened.pull_requests().next_id(), 3);
    }

    #[test]
    fn pr_create_validates_branches() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        let err = repo.execute(pr_create("ghost", "main")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = repo.execute(pr_create("main", "main")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn pr_queue_lifecycle() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(create_branch("a")).unwrap();
        repo.execute(create_branch("b")).unwrap();
        repo.execute(pr_create("a", "main")).unwrap();
        repo.execute(pr_create("b", "main")).unwrap();

        let Outcome::PrRejected(pr) = repo
            .execute(Command::Pr(PrCommand::Reject { id: 1 }))
            .unwrap()
        else {
            panic!("expected a rejection");
        };
        assert!(pr.closed_at.is_some());

        let Outcome::PrCancelled(pr) = repo
            .execute(Command::Pr(PrCommand::Cancel { id: 2 }))
            .unwrap()
        else {
            panic!("expected a cancellation");
        };
        assert_eq!(pr.status, PrStatus::Cancelled);
        assert_eq!(repo.pull_requests().len(), 1);

        assert_eq!(
            repo.execute(Command::Pr(PrCommand::Next)).unwrap(),
            Outcome::PrAdvanced(None)
        );
        assert_eq!(
            repo.execute(Command::Pr(PrCommand::Clear)).unwrap(),
            Outcome::PrCleared(1)
        );
        assert_eq!(
            repo.execute(Command::Pr(PrCommand::Status)).unwrap().to_string(),
            "No pull requests"
        );
    }

    #[test]
    fn contributor_scenario_rejects_duplicates() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(contributor_add("Bob", "dev")).unwrap();
        let err = repo.execute(contributor_add("Bob", "admin")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        repo.execute(contributor_add("Alice", "admin")).unwrap();

        let listing = repo
            .execute(Command::Contributors(ContributorCommand::List))
            .unwrap()
            .to_string();
        assert_eq!(listing, "Alice (admin)\nBob (dev)");
        assert_eq!(listing.matches("Bob").count(), 1);
    }

    #[test]
    fn contributor_find_and_remove() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        repo.execute(contributor_add("Bob", "dev")).unwrap();
        let found = repo
            .execute(Command::Contributors(ContributorCommand::Find {
                name: "Bob".into(),
            }))
            .unwrap();
        assert_eq!(found.to_string(), "Found contributor Bob (dev)");
        repo.execute(Command::Contributors(ContributorCommand::Remove {
            name: "Bob".into(),
        }))
        .unwrap();
        let err = repo
            .execute(Command::Contributors(ContributorCommand::Remove {
                name: "Bob".into(),
            }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn role_commands() {
        let fx = Fixture::new();
        let mut repo = fx.init();
        let role_add = |user: &str, role: &str, perms: &[&str]| {
            Command::Role(RoleCommand::Add {
                user: user.into(),
                role: role.into(),
                permissions: perms.iter().map(|p| p.to_string()).collect(),
            })
        };
        repo.execute(role_add("ann", "maintainer", &["merge", "push"])).unwrap();
        repo.execute(role_add("bob", "maintainer", &["tag"])).unwrap();

        let check = |user: &str, action: &str| {
            Command::Role(RoleCommand::Check {
                user: user.into(),
                action: action.into(),
            })
        };
        assert_eq!(
            repo.execute(check("ann", "tag")).unwrap().to_string(),
            "ann may tag"
        );
        assert_eq!(
            repo.execute(check("zed", "tag")).unwrap().to_string(),
            "zed may not tag"
        );

        let updated = repo
            .execute(Command::Role(RoleCommand::Update {
                user: "bob".into(),
                role: "reader".into(),
                permissions: vec!["read".into()],
            }))
            .unwrap();
        assert_eq!(
            updated.to_string(),
            "Updated from role maintainer; bob: role reader, permissions [read]"
        );

        let listing = repo.execute(Command::Role(RoleCommand::List)).unwrap().to_string();
        assert_eq!(
            listing,
            "ann: role maintainer, permissions [merge, push, tag]\nbob: role reader, permissions [read]"
        );

        repo.execute(Command::Role(RoleCommand::Remove { user: "ann".into() }))
            .unwrap();
        let err = repo
            .execute(Command::Role(RoleCommand::Show { user: "ann".into() }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn reopen_reproduces_every_record() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "a");
        fx.workdir.write("b.txt", "b");
        let mut repo = fx.init();
        repo.execute(add("a.txt")).unwrap();
        repo.execute(commit("first")).unwrap();
        repo.execute(create_branch("feature")).unwrap();
        repo.execute(add("b.txt")).unwrap();
        repo.execute(commit("second")).unwrap();
        repo.execute(pr_create("feature", "main")).unwrap();
        repo.execute(contributor_add("Bob", "dev")).unwrap();
        repo.execute(contributor_add("Alice", "admin")).unwrap();
        repo.execute(Command::Role(RoleCommand::Add {
            user: "ann".into(),
            role: "dev".into(),
            permissions: vec!["push".into()],
        }))
        .unwrap();
        fx.workdir.write("a.txt", "changed");
        repo.execute(add("a.txt")).unwrap();

        let reopened = fx.open();
        assert!(reopened.is_initialized());
        assert_eq!(reopened.chain(), repo.chain());
        assert_eq!(reopened.branches(), repo.branches());
        assert_eq!(reopened.staging(), repo.staging());
        assert_eq!(reopened.pull_requests(), repo.pull_requests());
        assert_eq!(reopened.contributors(), repo.contributors());
        assert_eq!(reopened.registry(), repo.registry());
        assert_eq!(reopened.head(), repo.head());
        assert_eq!(reopened.objects().keys(), repo.objects().keys());
    }

    #[test]
    fn corrupt_head_record_fails_to_open() {
        let fx = Fixture::new();
        fx.init();
        let head = HeadRecord {
            current_branch: "ghost".into(),
            current_commit: None,
        };
        save_record(fx.records.as_ref(), RecordKind::Head, &head).unwrap();
        let err = Repository::with_backends(
            "memory",
            fx.records.clone(),
            fx.workdir.clone(),
            fx.clock.clone(),
            RepoConfig::default(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn author_override_applies_to_commits() {
        let fx = Fixture::new();
        fx.workdir.write("a.txt", "a");
        let mut repo = fx.init();
        assert!(repo.set_author(" ").is_err());
        repo.set_author("ann@example.com").unwrap();
        repo.execute(add("a.txt")).unwrap();
        let Outcome::Committed(c) = repo.execute(commit("init")).unwrap() else {
            panic!("expected a commit");
        };
        assert_eq!(c.author, "ann@example.com");
    }

    #[test]
    fn file_backends_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "# grove\n").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "fn main() {}\n").unwrap();

        let mut repo = Repository::open_dir(dir.path()).unwrap();
        assert!(!repo.is_initialized());
        repo.execute(Command::Init).unwrap();
        repo.execute(add(".")).unwrap();
        repo.execute(commit("initial import")).unwrap();
        repo.execute(create_branch("docs")).unwrap();
        assert!(dir.path().join(".grove/commits.json").is_file());

        let mut reopened = Repository::open_dir(dir.path()).unwrap();
        assert_eq!(reopened.chain(), repo.chain());
        assert_eq!(reopened.staging().len(), 0);
        assert!(reopened.branches().contains("docs"));
        let Outcome::Status { status, .. } = reopened.execute(Command::Status).unwrap() else {
            panic!("expected status");
        };
        assert!(status.is_clean());
    }

    #[test]
    fn adding_a_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "fn main() {}\n").unwrap();

        let mut repo = Repository::open_dir(dir.path()).unwrap();
        repo.execute(Command::Init).unwrap();
        let err = repo.execute(add("src")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(repo.staging().is_empty());
    }

    proptest! {
        #[test]
        fn object_index_tracks_history(contents in proptest::collection::vec("[a-z]{1,8}", 1..25)) {
            let fx = Fixture::new();
            let mut repo = fx.init();
            for (i, content) in contents.iter().enumerate() {
                let path = format!("f{}.txt", i % 5);
                fx.workdir.write(path.clone(), content.as_str());
                repo.execute(add(&path)).unwrap();
                repo.execute(commit(&format!("commit {i}"))).unwrap();
            }
            prop_assert_eq!(repo.chain().len(), contents.len());
            for content in &contents {
                prop_assert!(repo.objects().search(&ContentHasher::BLOB.hash(content.as_bytes())));
            }
            prop_assert!(repo.objects().validate().is_ok());
        }
    }
}
