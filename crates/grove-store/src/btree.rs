//! B-tree set used as the repository's object index.
//!
//! [`BTreeIndex`] is a classic B-tree with minimum degree `t`: every node
//! except the root holds between `t - 1` and `2t - 1` keys, every internal
//! node with `k` keys has `k + 1` children, and all leaves sit at the same
//! depth. It stores keys only; membership is the whole contract.
//!
//! Insertion splits full nodes on the way down (a full root grows the tree
//! by one level). Deletion is single-pass: before descending into a child it
//! makes sure that child holds at least `t` keys, borrowing from a sibling or
//! merging with one, so a key can always be removed from a leaf without
//! walking back up. None of the balancing steps can fail, so every mutation
//! either completes or leaves the tree untouched.

use std::mem;

use grove_types::Fingerprint;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Minimum degree used when no explicit degree is configured.
pub const DEFAULT_MIN_DEGREE: usize = 50;

/// The object index: every file fingerprint ever committed.
pub type ObjectIndex = BTreeIndex<Fingerprint>;

#[derive(Clone, Debug)]
struct Node<K> {
    keys: Vec<K>,
    children: Vec<Node<K>>,
}

impl<K: Ord + Clone> Node<K> {
    fn leaf() -> Self {
        Self {
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn contains(&self, key: &K) -> bool {
        let mut node = self;
        loop {
            match node.keys.binary_search(key) {
                Ok(_) => return true,
                Err(_) if node.is_leaf() => return false,
                Err(i) => node = &node.children[i],
            }
        }
    }

    fn max_key(&self) -> Option<&K> {
        let mut node = self;
        while let Some(last) = node.children.last() {
            node = last;
        }
        node.keys.last()
    }

    fn min_key(&self) -> Option<&K> {
        let mut node = self;
        while let Some(first) = node.children.first() {
            node = first;
        }
        node.keys.first()
    }

    /// Split the full child at `i`, lifting its median into `self`.
    fn split_child(&mut self, i: usize, t: usize) {
        let child = &mut self.children[i];
        let right = Node {
            keys: child.keys.split_off(t),
            children: if child.is_leaf() {
                Vec::new()
            } else {
                child.children.split_off(t)
            },
        };
        let Some(median) = child.keys.pop() else {
            return;
        };
        self.keys.insert(i, median);
        self.children.insert(i + 1, right);
    }

    fn insert_non_full(&mut self, key: K, t: usize) {
        let mut i = match self.keys.binary_search(&key) {
            Ok(_) => return,
            Err(i) => i,
        };
        if self.is_leaf() {
            self.keys.insert(i, key);
            return;
        }
        if self.children[i].keys.len() == 2 * t - 1 {
            self.split_child(i, t);
            if key > self.keys[i] {
                i += 1;
            }
        }
        self.children[i].insert_non_full(key, t);
    }

    fn remove(&mut self, key: &K, t: usize) -> bool {
        match self.keys.binary_search(key) {
            Ok(i) if self.is_leaf() => {
                self.keys.remove(i);
                true
            }
            Ok(i) => self.remove_internal(i, t),
            Err(_) if self.is_leaf() => false,
            Err(i) => {
                let i = if self.children[i].keys.len() < t {
                    self.fill(i, t)
                } else {
                    i
                };
                self.children[i].remove(key, t)
            }
        }
    }

    /// Remove `keys[i]` from an internal node.
    fn remove_internal(&mut self, i: usize, t: usize) -> bool {
        if self.children[i].keys.len() >= t {
            let Some(pred) = self.children[i].max_key().cloned() else {
                return false;
            };
            self.keys[i] = pred.clone();
            self.children[i].remove(&pred, t)
        } else if self.children[i + 1].keys.len() >= t {
            let Some(succ) = self.children[i + 1].min_key().cloned() else {
                return false;
            };
            self.keys[i] = succ.clone();
            self.children[i + 1].remove(&succ, t)
        } else {
            let key = self.keys[i].clone();
            self.merge_children(i);
            self.children[i].remove(&key, t)
        }
    }

    /// Make sure `children[i]` holds at least `t` keys. Returns the index of
    /// the child that now covers the original key range (it moves left when
    /// the child is merged into its left sibling).
    fn fill(&mut self, i: usize, t: usize) -> usize {
        if i > 0 && self.children[i - 1].keys.len() >= t {
            self.borrow_from_prev(i);
            i
        } else if i < self.keys.len() && self.children[i + 1].keys.len() >= t {
            self.borrow_from_next(i);
            i
        } else if i < self.keys.len() {
            self.merge_children(i);
            i
        } else {
            self.merge_children(i - 1);
            i - 1
        }
    }

    fn borrow_from_prev(&mut self, i: usize) {
        let Node { keys, children } = self;
        let (left, right) = children.split_at_mut(i);
        let sibling = &mut left[i - 1];
        let child = &mut right[0];

        let Some(lifted) = sibling.keys.pop() else {
            return;
        };
        let separator = mem::replace(&mut keys[i - 1], lifted);
        child.keys.insert(0, separator);
        if let Some(grandchild) = sibling.children.pop() {
            child.children.insert(0, grandchild);
        }
    }

    fn borrow_from_next(&mut self, i: usize) {
        let Node { keys, children } = self;
        let (left, right) = children.split_at_mut(i + 1);
        let child = &mut left[i];
        let sibling = &mut right[0];

        if sibling.keys.is_empty() {
            return;
        }
        let lifted = sibling.keys.remove(0);
        let separator = mem::replace(&mut keys[i], lifted);
        child.keys.push(separator);
        if !sibling.children.is_empty() {
            child.children.push(sibling.children.remove(0));
        }
    }

    /// Merge `children[i + 1]` and the separator `keys[i]` into `children[i]`.
    fn merge_children(&mut self, i: usize) {
        let right = self.children.remove(i + 1);
        let separator = self.keys.remove(i);
        let left = &mut self.children[i];
        left.keys.push(separator);
        left.keys.extend(right.keys);
        left.children.extend(right.children);
    }

    fn collect_preorder(&self, out: &mut Vec<K>) {
        out.extend(self.keys.iter().cloned());
        for child in &self.children {
            child.collect_preorder(out);
        }
    }

    fn collect_inorder(&self, out: &mut Vec<K>) {
        if self.is_leaf() {
            out.extend(self.keys.iter().cloned());
            return;
        }
        for (i, key) in self.keys.iter().enumerate() {
            self.children[i].collect_inorder(out);
            out.push(key.clone());
        }
        if let Some(last) = self.children.last() {
            last.collect_inorder(out);
        }
    }

    /// Check node-local bounds recursively, recording the depth of every leaf.
    fn check(&self, t: usize, is_root: bool, depth: usize, leaf_depths: &mut Vec<usize>) -> StoreResult<usize> {
        let n = self.keys.len();
        if n > 2 * t - 1 {
            return Err(StoreError::InvariantViolation(format!(
                "node at depth {depth} holds {n} keys (max {})",
                2 * t - 1
            )));
        }
        if !is_root && n < t - 1 {
            return Err(StoreError::InvariantViolation(format!(
                "node at depth {depth} holds {n} keys (min {})",
                t - 1
            )));
        }
        if self.keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StoreError::InvariantViolation(format!(
                "keys out of order in node at depth {depth}"
            )));
        }
        if self.is_leaf() {
            leaf_depths.push(depth);
            return Ok(n);
        }
        if self.children.len() != n + 1 {
            return Err(StoreError::InvariantViolation(format!(
                "internal node at depth {depth} has {n} keys but {} children",
                self.children.len()
            )));
        }
        let mut count = n;
        for child in &self.children {
            count += child.check(t, false, depth + 1, leaf_depths)?;
        }
        Ok(count)
    }
}

/// A B-tree set of ordered keys with configurable minimum degree.
#[derive(Clone, Debug)]
pub struct BTreeIndex<K> {
    root: Node<K>,
    min_degree: usize,
    len: usize,
}

impl<K: Ord + Clone> BTreeIndex<K> {
    /// Create an empty index with minimum degree `t` (must be at least 2).
    pub fn with_min_degree(t: usize) -> StoreResult<Self> {
        if t < 2 {
            return Err(StoreError::InvalidDegree(t));
        }
        Ok(Self {
            root: Node::leaf(),
            min_degree: t,
            len: 0,
        })
    }

    pub fn min_degree(&self) -> usize {
        self.min_degree
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels; an empty tree has height 1 (a single empty leaf).
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Some(first) = node.children.first() {
            height += 1;
            node = first;
        }
        height
    }

    /// Returns `true` if `key` is present.
    pub fn search(&self, key: &K) -> bool {
        self.root.contains(key)
    }

    /// Insert `key`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.root.contains(&key) {
            return false;
        }
        let t = self.min_degree;
        if self.root.keys.len() == 2 * t - 1 {
            let old_root = mem::replace(&mut self.root, Node::leaf());
            self.root.children.push(old_root);
            self.root.split_child(0, t);
            debug!(height = self.height(), "object index root split");
        }
        self.root.insert_non_full(key, t);
        self.len += 1;
        true
    }

    /// Remove `key`. Returns `false` if it was not present.
    pub fn delete(&mut self, key: &K) -> bool {
        let removed = self.root.remove(key, self.min_degree);
        if self.root.keys.is_empty() && !self.root.is_leaf() {
            self.root = self.root.children.remove(0);
            debug!(height = self.height(), "object index root collapsed");
        }
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Keys node by node: a node's keys, then each child subtree in order.
    pub fn preorder(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect_preorder(&mut out);
        out
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect_inorder(&mut out);
        out
    }

    /// Verify the structural invariants: key-count bounds, child counts,
    /// equal leaf depth, and global ordering.
    pub fn validate(&self) -> StoreResult<()> {
        let mut leaf_depths = Vec::new();
        let count = self.root.check(self.min_degree, true, 0, &mut leaf_depths)?;
        if leaf_depths.windows(2).any(|w| w[0] != w[1]) {
            return Err(StoreError::InvariantViolation(
                "leaves are not all at the same depth".into(),
            ));
        }
        if count != self.len {
            return Err(StoreError::InvariantViolation(format!(
                "tracked length {} but found {count} keys",
                self.len
            )));
        }
        if self.keys().windows(2).any(|w| w[0] >= w[1]) {
            return Err(StoreError::InvariantViolation(
                "in-order traversal is not strictly ascending".into(),
            ));
        }
        Ok(())
    }
}

impl<K: Ord + Clone> Default for BTreeIndex<K> {
    fn default() -> Self {
        Self {
            root: Node::leaf(),
            min_degree: DEFAULT_MIN_DEGREE,
            len: 0,
        }
    }
}

impl<K: Ord + Clone> Extend<K> for BTreeIndex<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}
