//! Contributor directory: an unbalanced binary search tree keyed by name.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{require_name, GateError, GateResult};

/// A contributor and their role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub role: String,
}

impl fmt::Display for Contributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}

type Link = Option<Box<Node>>;

struct Node {
    entry: Contributor,
    left: Link,
    right: Link,
}

/// Contributors ordered by name. Names are unique.
///
/// No rebalancing is done. Deleting a node with two children copies its
/// in-order successor into it and removes the successor from the right
/// subtree.
///
/// Sorted inserts degrade the tree into a chain, so every walk over it
/// (including clone, comparison and drop) uses an explicit stack.
#[derive(Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Contributor>", into = "Vec<Contributor>")]
pub struct ContributorDirectory {
    root: Link,
    len: usize,
}

impl ContributorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, name: &str, role: &str) -> GateResult<()> {
        require_name("contributor name", name)?;
        require_name("role", role)?;
        let placed = self.place(Contributor {
            name: name.to_string(),
            role: role.to_string(),
        });
        if !placed {
            return Err(GateError::DuplicateContributor(name.to_string()));
        }
        tracing::debug!(name, role, "added contributor");
        Ok(())
    }

    /// Attach `entry` as a new leaf. Returns `false` if the name is taken.
    fn place(&mut self, entry: Contributor) -> bool {
        let mut link = &mut self.root;
        while let Some(node) = link {
            link = match entry.name.cmp(&node.entry.name) {
                Ordering::Less => &mut node.left,
                Ordering::Greater => &mut node.right,
                Ordering::Equal => return false,
            };
        }
        *link = Some(Box::new(Node {
            entry,
            left: None,
            right: None,
        }));
        self.len += 1;
        true
    }

    pub fn find(&self, name: &str) -> Option<&Contributor> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match name.cmp(node.entry.name.as_str()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.entry),
            };
        }
        None
    }

    pub fn delete(&mut self, name: &str) -> GateResult<Contributor> {
        let removed = delete_at(&mut self.root, name)
            .ok_or_else(|| GateError::ContributorNotFound(name.to_string()))?;
        self.len -= 1;
        Ok(removed)
    }

    /// Contributors in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = &Contributor> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<&Node> = Vec::new();
        let mut current = self.root.as_deref();
        loop {
            while let Some(node) = current {
                stack.push(node);
                current = node.left.as_deref();
            }
            let Some(node) = stack.pop() else { break };
            out.push(&node.entry);
            current = node.right.as_deref();
        }
        out.into_iter()
    }

    /// `name (role)` lines in ascending name order.
    pub fn list_inorder(&self) -> Vec<String> {
        self.iter().map(Contributor::to_string).collect()
    }

    /// Entries in preorder; inserting them in this order rebuilds the same shape.
    pub fn preorder(&self) -> Vec<Contributor> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<&Node> = self.root.as_deref().into_iter().collect();
        while let Some(node) = stack.pop() {
            out.push(node.entry.clone());
            stack.extend(node.right.as_deref());
            stack.extend(node.left.as_deref());
        }
        out
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(&Node, usize)> = Vec::new();
        stack.extend(self.root.as_deref().map(|n| (n, 1)));
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            stack.extend(node.left.as_deref().map(|n| (n, depth + 1)));
            stack.extend(node.right.as_deref().map(|n| (n, depth + 1)));
        }
        height
    }

    /// In-order traversal must be strictly ascending and match the length.
    pub fn validate(&self) -> GateResult<()> {
        let names: Vec<&str> = self.iter().map(|c| c.name.as_str()).collect();
        if names.len() != self.len {
            return Err(GateError::InvariantViolation(format!(
                "length {} but {} nodes",
                self.len,
                names.len()
            )));
        }
        if let Some(pair) = names.windows(2).find(|w| w[0] >= w[1]) {
            return Err(GateError::InvariantViolation(format!(
                "contributors out of order: {:?} before {:?}",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }
}

fn delete_at(mut link: &mut Link, name: &str) -> Option<Contributor> {
    while link.as_ref().is_some_and(|n| n.entry.name != name) {
        let node = link.as_mut()?;
        link = if name < node.entry.name.as_str() {
            &mut node.left
        } else {
            &mut node.right
        };
    }
    let mut node = link.take()?;
    match (node.left.take(), node.right.take()) {
        (None, only) | (only, None) => {
            *link = only;
            Some(node.entry)
        }
        (Some(left), Some(right)) => {
            node.left = Some(left);
            node.right = Some(right);
            let successor = take_min(&mut node.right)?;
            let removed = std::mem::replace(&mut node.entry, successor);
            *link = Some(node);
            Some(removed)
        }
    }
}

/// Unlink the leftmost node under `link` and return its entry.
fn take_min(mut link: &mut Link) -> Option<Contributor> {
    while link.as_ref()?.left.is_some() {
        link = &mut link.as_mut()?.left;
    }
    let mut node = link.take()?;
    *link = node.right.take();
    Some(node.entry)
}

impl Clone for ContributorDirectory {
    /// Copies the exact shape, building each node after its children.
    fn clone(&self) -> Self {
        let mut postorder: Vec<&Node> = Vec::with_capacity(self.len);
        let mut stack: Vec<&Node> = self.root.as_deref().into_iter().collect();
        while let Some(node) = stack.pop() {
            postorder.push(node);
            stack.extend(node.left.as_deref());
            stack.extend(node.right.as_deref());
        }

        let mut built: Vec<Box<Node>> = Vec::new();
        for node in postorder.into_iter().rev() {
            let right = if node.right.is_some() { built.pop() } else { None };
            let left = if node.left.is_some() { built.pop() } else { None };
            built.push(Box::new(Node {
                entry: node.entry.clone(),
                left,
                right,
            }));
        }
        Self {
            root: built.pop(),
            len: self.len,
        }
    }
}

impl PartialEq for ContributorDirectory {
    /// Same entries in the same shape; a BST's preorder fixes its shape.
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.preorder() == other.preorder()
    }
}

impl Eq for ContributorDirectory {}

impl fmt::Debug for ContributorDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Drop for ContributorDirectory {
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

impl TryFrom<Vec<Contributor>> for ContributorDirectory {
    type Error = GateError;

    fn try_from(entries: Vec<Contributor>) -> GateResult<Self> {
        let mut dir = Self::new();
        for c in entries {
            dir.insert(&c.name, &c.role)
                .map_err(|e| GateError::InvalidRecord(e.to_string()))?;
        }
        Ok(dir)
    }
}

impl From<ContributorDirectory> for Vec<Contributor> {
    fn from(dir: ContributorDirectory) -> Self {
        dir.preorder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn directory(names: &[&str]) -> ContributorDirectory {
        let mut dir = ContributorDirectory::new();
        for name in names {
            dir.insert(name, "dev").unwrap();
        }
        dir
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut dir = ContributorDirectory::new();
        dir.insert("Bob", "dev").unwrap();
        assert_eq!(
            dir.insert("Bob", "admin"),
            Err(GateError::DuplicateContributor("Bob".into()))
        );
        assert_eq!(dir.list_inorder(), vec!["Bob (dev)"]);
    }

    #[test]
    fn list_is_ascending() {
        let dir = directory(&["Mia", "Ann", "Zoe", "Bob"]);
        assert_eq!(
            dir.list_inorder(),
            vec!["Ann (dev)", "Bob (dev)", "Mia (dev)", "Zoe (dev)"]
        );
    }

    #[test]
    fn find_returns_role() {
        let mut dir = ContributorDirectory::new();
        dir.insert("Ann", "maintainer").unwrap();
        assert_eq!(dir.find("Ann").map(|c| c.role.as_str()), Some("maintainer"));
        assert!(dir.find("Ben").is_none());
    }

    #[test]
    fn delete_leaf_and_single_child() {
        let mut dir = directory(&["M", "F", "T", "A"]);
        assert_eq!(dir.delete("A").unwrap().name, "A");
        assert_eq!(dir.delete("F").unwrap().name, "F");
        assert_eq!(dir.list_inorder(), vec!["M (dev)", "T (dev)"]);
        dir.validate().unwrap();
    }

    #[test]
    fn delete_two_children_promotes_successor() {
        //        M
        //      /   \
        //     F     T
        //          / \
        //         P   W
        //          \
        //           R
        let mut dir = directory(&["M", "F", "T", "P", "W", "R"]);
        assert_eq!(dir.delete("M").unwrap().name, "M");
        let shape: Vec<String> = dir.preorder().into_iter().map(|c| c.name).collect();
        assert_eq!(shape, vec!["P", "F", "T", "R", "W"]);
        dir.validate().unwrap();
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut dir = directory(&["A"]);
        assert_eq!(dir.delete("B"), Err(GateError::ContributorNotFound("B".into())));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn preorder_record_rebuilds_same_shape() {
        let dir = directory(&["M", "F", "T", "A", "H", "W"]);
        let json = serde_json::to_string(&dir).unwrap();
        let back: ContributorDirectory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dir);
        assert_eq!(back.height(), dir.height());
    }

    #[test]
    fn record_with_duplicates_is_rejected() {
        let json = r#"[{"name":"A","role":"x"},{"name":"A","role":"y"}]"#;
        assert!(serde_json::from_str::<ContributorDirectory>(json).is_err());
    }

    #[test]
    fn no_rebalancing_on_sorted_input() {
        let dir = directory(&["a", "b", "c", "d"]);
        assert_eq!(dir.height(), 4);
    }

    #[test]
    fn deep_chain_clones_compares_and_drops() {
        const DEPTH: usize = 200_000;
        let mut root: Link = None;
        for i in (0..DEPTH).rev() {
            root = Some(Box::new(Node {
                entry: Contributor {
                    name: format!("c{i:07}"),
                    role: "dev".into(),
                },
                left: None,
                right: root,
            }));
        }
        let dir = ContributorDirectory { root, len: DEPTH };
        assert_eq!(dir.height(), DEPTH);
        assert!(dir.validate().is_ok());

        let mut copy = dir.clone();
        assert!(copy == dir);
        assert_eq!(copy.delete("c0000000").unwrap().name, "c0000000");
        assert_eq!(copy.delete(&format!("c{:07}", DEPTH - 1)).unwrap().role, "dev");
        assert!(copy != dir);
        drop(copy);
        drop(dir);
    }

    #[test]
    fn clone_keeps_shape() {
        let dir = directory(&["m", "c", "x", "a", "e", "z"]);
        let copy = dir.clone();
        assert_eq!(copy.preorder(), dir.preorder());
        assert_eq!(copy.height(), dir.height());
        assert_eq!(copy.len(), 6);
    }

    proptest! {
        #[test]
        fn inorder_stays_strictly_ascending(
            ops in proptest::collection::vec((any::<bool>(), "[a-e]{1,2}"), 1..200)
        ) {
            let mut dir = ContributorDirectory::new();
            let mut model = BTreeMap::new();
            for (insert, name) in ops {
                if insert {
                    let expected_ok = !model.contains_key(&name);
                    prop_assert_eq!(dir.insert(&name, "r").is_ok(), expected_ok);
                    model.entry(name).or_insert(());
                } else {
                    prop_assert_eq!(dir.delete(&name).is_ok(), model.remove(&name).is_some());
                }
                prop_assert!(dir.validate().is_ok());
            }
            let names: Vec<_> = dir.iter().map(|c| c.name.clone()).collect();
            let expected: Vec<_> = model.into_keys().collect();
            prop_assert_eq!(names, expected);
        }
    }
}
