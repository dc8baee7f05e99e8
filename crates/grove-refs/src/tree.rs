//! The N-ary branch tree.

use std::collections::HashSet;

use grove_types::CommitId;

use crate::error::{RefError, RefResult};
use crate::names::validate_branch_name;

/// Name of the permanent root branch.
pub const MAIN_BRANCH: &str = "main";

/// Stable arena index of a branch node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BranchId(usize);

impl BranchId {
    /// The root branch.
    pub const ROOT: Self = Self(0);
}

/// A named branch, optionally pointing at a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchNode {
    name: String,
    commit: Option<CommitId>,
    parent: Option<BranchId>,
    children: Vec<BranchId>,
    live: bool,
}

impl BranchNode {
    fn new(name: String, commit: Option<CommitId>, parent: Option<BranchId>) -> Self {
        Self {
            name,
            commit,
            parent,
            children: Vec::new(),
            live: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commit(&self) -> Option<CommitId> {
        self.commit
    }

    pub fn parent(&self) -> Option<BranchId> {
        self.parent
    }

    /// Child branches in creation order.
    pub fn children(&self) -> &[BranchId] {
        &self.children
    }
}

/// Hierarchy of branches rooted at [`MAIN_BRANCH`].
///
/// Nodes are stored in an arena; a child records its parent's [`BranchId`]
/// and a parent lists its children in creation order. Names are unique
/// across the tree. Lookups by name walk the tree in preorder.
///
/// Deleting a branch unlinks it from its parent without re-homing its
/// children. Those descendants become unreachable and their slots are
/// reused by later insertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchTree {
    nodes: Vec<BranchNode>,
    free: Vec<usize>,
}

impl Default for BranchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchTree {
    /// A tree holding only `main`, with no commit.
    pub fn new() -> Self {
        Self {
            nodes: vec![BranchNode::new(MAIN_BRANCH.to_string(), None, None)],
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> &BranchNode {
        &self.nodes[BranchId::ROOT.0]
    }

    /// Node at `id`, if that slot holds a live branch.
    pub fn get(&self, id: BranchId) -> Option<&BranchNode> {
        self.nodes.get(id.0).filter(|n| n.live)
    }

    fn get_mut(&mut self, id: BranchId) -> Option<&mut BranchNode> {
        self.nodes.get_mut(id.0).filter(|n| n.live)
    }

    /// Number of reachable branches.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Always `false`: `main` is permanent.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Preorder walk from the root, yielding each id with its depth.
    fn walk(&self) -> Vec<(BranchId, usize)> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![(BranchId::ROOT, 0)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            order.push((id, depth));
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        order
    }

    pub fn find_id(&self, name: &str) -> Option<BranchId> {
        self.walk()
            .into_iter()
            .map(|(id, _)| id)
            .find(|&id| self.get(id).is_some_and(|n| n.name == name))
    }

    pub fn find(&self, name: &str) -> Option<&BranchNode> {
        self.find_id(name).and_then(|id| self.get(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find_id(name).is_some()
    }

    /// The parent branch of `name`; `None` for `main` or unknown names.
    pub fn parent_of(&self, name: &str) -> Option<&BranchNode> {
        self.find(name)?.parent.and_then(|p| self.get(p))
    }

    fn alloc(&mut self, node: BranchNode) -> BranchId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                BranchId(slot)
            }
            None => {
                self.nodes.push(node);
                BranchId(self.nodes.len() - 1)
            }
        }
    }

    /// Create `new_name` as the last child of `parent_name`.
    ///
    /// The new branch starts at its parent's commit.
    pub fn add_branch(&mut self, parent_name: &str, new_name: &str) -> RefResult<BranchId> {
        validate_branch_name(new_name)?;
        if self.contains(new_name) {
            return Err(RefError::AlreadyExists {
                name: new_name.to_string(),
            });
        }
        let parent_id = self.find_id(parent_name).ok_or_else(|| RefError::NotFound {
            name: parent_name.to_string(),
        })?;
        let commit = self.get(parent_id).and_then(|p| p.commit);
        self.attach(parent_id, new_name.to_string(), commit)
    }

    fn attach(
        &mut self,
        parent_id: BranchId,
        name: String,
        commit: Option<CommitId>,
    ) -> RefResult<BranchId> {
        if self.get(parent_id).is_none() {
            return Err(RefError::InvariantViolation(format!(
                "parent slot {} is not live",
                parent_id.0
            )));
        }
        tracing::debug!(branch = %name, "attaching branch");
        let id = self.alloc(BranchNode::new(name, commit, Some(parent_id)));
        if let Some(parent) = self.get_mut(parent_id) {
            parent.children.push(id);
        }
        Ok(id)
    }

    /// Unlink `name` from its parent.
    ///
    /// Returns the names of the descendants that became unreachable, in
    /// preorder. `main` can never be deleted.
    pub fn delete_branch(&mut self, name: &str) -> RefResult<Vec<String>> {
        if name == MAIN_BRANCH {
            return Err(RefError::ProtectedBranch {
                name: name.to_string(),
            });
        }
        let id = self.find_id(name).ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })?;
        let subtree = self.subtree(id);

        if let Some(parent_id) = self.get(id).and_then(|n| n.parent) {
            if let Some(parent) = self.get_mut(parent_id) {
                parent.children.retain(|&child| child != id);
            }
        }

        let mut orphaned = Vec::with_capacity(subtree.len().saturating_sub(1));
        for slot in subtree {
            let node = &mut self.nodes[slot.0];
            if slot != id {
                orphaned.push(std::mem::take(&mut node.name));
            }
            node.live = false;
            node.children.clear();
            node.parent = None;
            node.commit = None;
            self.free.push(slot.0);
        }
        tracing::debug!(branch = %name, orphaned = orphaned.len(), "deleted branch");
        Ok(orphaned)
    }

    /// `id` followed by all its descendants, preorder.
    fn subtree(&self, id: BranchId) -> Vec<BranchId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else { continue };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Returns `true` if `name` is `ancestor` or lies somewhere below it.
    pub fn subtree_contains(&self, ancestor: &str, name: &str) -> bool {
        let (Some(ancestor_id), Some(mut current)) = (self.find_id(ancestor), self.find_id(name))
        else {
            return false;
        };
        loop {
            if current == ancestor_id {
                return true;
            }
            match self.get(current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Point `name` at `commit`.
    pub fn set_commit(&mut self, name: &str, commit: CommitId) -> RefResult<()> {
        let id = self.find_id(name).ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })?;
        if let Some(node) = self.get_mut(id) {
            node.commit = Some(commit);
        }
        Ok(())
    }

    /// Branch names in preorder, each indented two spaces per level.
    pub fn list_preorder(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .filter_map(|(id, depth)| {
                self.get(id)
                    .map(|n| format!("{}{}", "  ".repeat(depth), n.name))
            })
            .collect()
    }

    /// Branch names in preorder, without indentation.
    pub fn names(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .filter_map(|(id, _)| self.get(id).map(|n| n.name.clone()))
            .collect()
    }

    /// Check the root, parent links, name uniqueness and reachability.
    pub fn validate(&self) -> RefResult<()> {
        let root = self.root();
        if !root.live || root.name != MAIN_BRANCH || root.parent.is_some() {
            return Err(RefError::InvariantViolation("root must be a live 'main' branch".into()));
        }
        let mut names = HashSet::new();
        let walk = self.walk();
        for &(id, _) in &walk {
            let Some(node) = self.get(id) else { continue };
            if !names.insert(node.name.as_str()) {
                return Err(RefError::InvariantViolation(format!(
                    "duplicate branch name {:?}",
                    node.name
                )));
            }
            for &child in &node.children {
                if self.get(child).and_then(|c| c.parent) != Some(id) {
                    return Err(RefError::InvariantViolation(format!(
                        "child of {:?} has a stale parent link",
                        node.name
                    )));
                }
            }
        }
        if walk.len() != self.len() {
            return Err(RefError::InvariantViolation(format!(
                "{} live nodes but {} reachable",
                self.len(),
                walk.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn attach_restored(
        &mut self,
        parent_id: BranchId,
        name: String,
        commit: Option<CommitId>,
    ) -> RefResult<BranchId> {
        self.attach(parent_id, name, commit)
    }

    pub(crate) fn set_root_commit(&mut self, commit: Option<CommitId>) {
        self.nodes[BranchId::ROOT.0].commit = commit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_types::Fingerprint;
    use proptest::prelude::*;

    fn commit(tag: &str) -> CommitId {
        CommitId::new(Fingerprint::from_bytes(tag.as_bytes()))
    }

    fn sample() -> BranchTree {
        // main
        //   feature
        //     feature/ui
        //   hotfix
        let mut tree = BranchTree::new();
        tree.add_branch("main", "feature").unwrap();
        tree.add_branch("feature", "feature/ui").unwrap();
        tree.add_branch("main", "hotfix").unwrap();
        tree
    }

    #[test]
    fn new_tree_has_only_main() {
        let tree = BranchTree::new();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().name(), MAIN_BRANCH);
        assert!(tree.root().commit().is_none());
        assert_eq!(tree.list_preorder(), vec!["main"]);
    }

    #[test]
    fn list_preorder_indents_by_depth() {
        let tree = sample();
        assert_eq!(
            tree.list_preorder(),
            vec!["main", "  feature", "    feature/ui", "  hotfix"]
        );
        tree.validate().unwrap();
    }

    #[test]
    fn add_branch_rejects_duplicates_anywhere() {
        let mut tree = sample();
        assert_eq!(
            tree.add_branch("hotfix", "feature/ui"),
            Err(RefError::AlreadyExists {
                name: "feature/ui".into()
            })
        );
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn add_branch_requires_parent() {
        let mut tree = BranchTree::new();
        assert!(matches!(
            tree.add_branch("ghost", "x"),
            Err(RefError::NotFound { name }) if name == "ghost"
        ));
    }

    #[test]
    fn add_branch_validates_name() {
        let mut tree = BranchTree::new();
        assert!(matches!(
            tree.add_branch("main", "bad name"),
            Err(RefError::InvalidBranchName { .. })
        ));
    }

    #[test]
    fn new_branch_inherits_parent_commit() {
        let mut tree = BranchTree::new();
        tree.set_commit("main", commit("c1")).unwrap();
        tree.add_branch("main", "feature").unwrap();
        assert_eq!(tree.find("feature").unwrap().commit(), Some(commit("c1")));
    }

    #[test]
    fn main_cannot_be_deleted() {
        let mut tree = sample();
        assert_eq!(
            tree.delete_branch("main"),
            Err(RefError::ProtectedBranch { name: "main".into() })
        );
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn delete_leaf() {
        let mut tree = sample();
        assert!(tree.delete_branch("hotfix").unwrap().is_empty());
        assert!(!tree.contains("hotfix"));
        assert_eq!(tree.list_preorder(), vec!["main", "  feature", "    feature/ui"]);
        tree.validate().unwrap();
    }

    #[test]
    fn delete_orphans_descendants() {
        let mut tree = sample();
        let orphaned = tree.delete_branch("feature").unwrap();
        assert_eq!(orphaned, vec!["feature/ui"]);
        assert!(!tree.contains("feature/ui"));
        assert_eq!(tree.len(), 2);
        tree.validate().unwrap();

        // Orphaned names are free again and slots are reused.
        tree.add_branch("main", "feature/ui").unwrap();
        assert_eq!(tree.len(), 3);
        tree.validate().unwrap();
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let mut tree = sample();
        assert!(matches!(tree.delete_branch("nope"), Err(RefError::NotFound { .. })));
    }

    #[test]
    fn subtree_contains_walks_parents() {
        let tree = sample();
        assert!(tree.subtree_contains("feature", "feature/ui"));
        assert!(tree.subtree_contains("feature", "feature"));
        assert!(tree.subtree_contains("main", "hotfix"));
        assert!(!tree.subtree_contains("hotfix", "feature/ui"));
        assert!(!tree.subtree_contains("ghost", "main"));
    }

    #[test]
    fn parent_of_reports_parent() {
        let tree = sample();
        assert_eq!(tree.parent_of("feature/ui").unwrap().name(), "feature");
        assert!(tree.parent_of("main").is_none());
    }

    #[test]
    fn set_commit_unknown_branch() {
        let mut tree = BranchTree::new();
        assert!(tree.set_commit("ghost", commit("c")).is_err());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Add(usize, usize),
        Delete(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..8usize, 0..8usize).prop_map(|(p, n)| Op::Add(p, n)),
            (0..8usize).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn random_edits_keep_tree_well_formed(ops in proptest::collection::vec(op_strategy(), 1..60)) {
            let name = |i: usize| if i == 0 { MAIN_BRANCH.to_string() } else { format!("b{i}") };
            let mut tree = BranchTree::new();
            for op in ops {
                match op {
                    Op::Add(p, n) => {
                        let existed = tree.contains(&name(n));
                        let parent_exists = tree.contains(&name(p));
                        let result = tree.add_branch(&name(p), &name(n));
                        prop_assert_eq!(result.is_ok(), !existed && parent_exists);
                    }
                    Op::Delete(n) => {
                        let existed = tree.contains(&name(n));
                        let result = tree.delete_branch(&name(n));
                        prop_assert_eq!(result.is_ok(), existed && n != 0);
                        prop_assert!(!tree.contains(&name(n)) || n == 0);
                    }
                }
                prop_assert!(tree.validate().is_ok());
                prop_assert!(tree.contains(MAIN_BRANCH));
            }
        }
    }
}
