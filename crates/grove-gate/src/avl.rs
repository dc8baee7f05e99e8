//! Height-balanced binary search tree.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use crate::error::{GateError, GateResult};

type Link<K, V> = Option<Box<AvlNode<K, V>>>;

struct AvlNode<K, V> {
    key: K,
    value: V,
    height: usize,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> AvlNode<K, V> {
    fn leaf(key: K, value: V) -> Box<Self> {
        Box::new(Self {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    /// Left height minus right height.
    fn balance(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn height<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

fn rotate_right<K, V>(mut node: Box<AvlNode<K, V>>) -> Box<AvlNode<K, V>> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left<K, V>(mut node: Box<AvlNode<K, V>>) -> Box<AvlNode<K, V>> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Restore the balance of `node` after one of its subtrees changed height.
///
/// The heavy child's own balance picks between a single rotation and a
/// double (left-right / right-left) rotation. After a deletion the heavy
/// child is the sibling of the shrunken subtree, and a sibling with balance
/// 0 takes the single rotation.
fn rebalance<K, V>(mut node: Box<AvlNode<K, V>>) -> Box<AvlNode<K, V>> {
    node.update_height();
    let balance = node.balance();
    if balance > 1 {
        if node.left.as_ref().map_or(0, |l| l.balance()) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().map_or(0, |r| r.balance()) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

fn insert_at<K: Ord, V>(link: Link<K, V>, key: K, value: V) -> (Box<AvlNode<K, V>>, Option<V>) {
    let Some(mut node) = link else {
        return (AvlNode::leaf(key, value), None);
    };
    let replaced = match key.cmp(&node.key) {
        Ordering::Less => {
            let (child, replaced) = insert_at(node.left.take(), key, value);
            node.left = Some(child);
            replaced
        }
        Ordering::Greater => {
            let (child, replaced) = insert_at(node.right.take(), key, value);
            node.right = Some(child);
            replaced
        }
        Ordering::Equal => {
            let old = std::mem::replace(&mut node.value, value);
            return (node, Some(old));
        }
    };
    (rebalance(node), replaced)
}

fn remove_at<K, V, Q>(link: Link<K, V>, key: &Q) -> (Link<K, V>, Option<(K, V)>)
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    let Some(mut node) = link else {
        return (None, None);
    };
    let removed = match key.cmp(node.key.borrow()) {
        Ordering::Less => {
            let (child, removed) = remove_at(node.left.take(), key);
            node.left = child;
            removed
        }
        Ordering::Greater => {
            let (child, removed) = remove_at(node.right.take(), key);
            node.right = child;
            removed
        }
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, only) | (only, None) => {
                let AvlNode { key, value, .. } = *node;
                return (only, Some((key, value)));
            }
            (Some(left), Some(right)) => {
                // Promote the in-order successor into this node.
                let (rest, (succ_key, succ_value)) = take_min(right);
                node.left = Some(left);
                node.right = rest;
                let old_key = std::mem::replace(&mut node.key, succ_key);
                let old_value = std::mem::replace(&mut node.value, succ_value);
                Some((old_key, old_value))
            }
        },
    };
    (Some(rebalance(node)), removed)
}

fn take_min<K, V>(mut node: Box<AvlNode<K, V>>) -> (Link<K, V>, (K, V)) {
    match node.left.take() {
        None => {
            let AvlNode {
                key, value, right, ..
            } = *node;
            (right, (key, value))
        }
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

/// An ordered map kept height-balanced: every node's balance factor stays
/// in `{-1, 0, 1}` after each insert and remove.
pub struct AvlMap<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<K: Ord, V> AvlMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        height(&self.root)
    }

    /// Insert or replace, returning the previous value for `key`.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (root, replaced) = insert_at(self.root.take(), key, value);
        self.root = Some(root);
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (root, removed) = remove_at(self.root.take(), key);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left.as_deref_mut(),
                Ordering::Greater => node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
            };
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Check ordering, stored heights, balance factors and the length.
    pub fn validate(&self) -> GateResult<()> {
        fn check<K: Ord, V>(link: &Link<K, V>, count: &mut usize) -> GateResult<usize> {
            let Some(node) = link else { return Ok(0) };
            *count += 1;
            if node.left.as_ref().is_some_and(|l| l.key >= node.key)
                || node.right.as_ref().is_some_and(|r| r.key <= node.key)
            {
                return Err(GateError::InvariantViolation("AVL ordering broken".into()));
            }
            let left = check(&node.left, count)?;
            let right = check(&node.right, count)?;
            if node.height != 1 + left.max(right) {
                return Err(GateError::InvariantViolation("stale AVL height".into()));
            }
            if left.abs_diff(right) > 1 {
                return Err(GateError::InvariantViolation(format!(
                    "balance factor {} out of range",
                    left as isize - right as isize
                )));
            }
            Ok(node.height)
        }

        let mut count = 0;
        check(&self.root, &mut count)?;
        if count != self.len {
            return Err(GateError::InvariantViolation(format!(
                "length {} but {count} nodes",
                self.len
            )));
        }
        let keys: Vec<&K> = self.keys().collect();
        if keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GateError::InvariantViolation("in-order keys not ascending".into()));
        }
        Ok(())
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for AvlMap<K, V> {
    fn clone(&self) -> Self {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K: Ord + PartialEq, V: PartialEq> PartialEq for AvlMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Ord + Eq, V: Eq> Eq for AvlMap<K, V> {}

impl<K: Ord, V> FromIterator<(K, V)> for AvlMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// In-order iterator over an [`AvlMap`].
pub struct Iter<'a, K, V> {
    stack: Vec<&'a AvlNode<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut node: Option<&'a AvlNode<K, V>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((&node.key, &node.value))
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a AvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
