//! Stored form of the branch tree.

use std::collections::HashSet;

use grove_types::CommitId;
use serde::{Deserialize, Serialize};

use crate::error::{RefError, RefResult};
use crate::names::validate_branch_name;
use crate::tree::{BranchId, BranchTree, MAIN_BRANCH};

/// A branch and its subtree, nested the way the tree is shaped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub name: String,
    pub commit: Option<CommitId>,
    #[serde(default)]
    pub children: Vec<BranchRecord>,
}

impl BranchTree {
    /// Nested record of every reachable branch.
    pub fn to_record(&self) -> BranchRecord {
        self.record_at(BranchId::ROOT)
    }

    fn record_at(&self, id: BranchId) -> BranchRecord {
        match self.get(id) {
            Some(node) => BranchRecord {
                name: node.name().to_string(),
                commit: node.commit(),
                children: node
                    .children()
                    .iter()
                    .map(|&child| self.record_at(child))
                    .collect(),
            },
            None => BranchRecord {
                name: String::new(),
                commit: None,
                children: Vec::new(),
            },
        }
    }

    /// Rebuild a tree from its record.
    ///
    /// The root must be `main`; every other name must be valid and unique.
    pub fn from_record(record: &BranchRecord) -> RefResult<Self> {
        if record.name != MAIN_BRANCH {
            return Err(RefError::InvalidRecord(format!(
                "root branch must be {MAIN_BRANCH:?}, found {:?}",
                record.name
            )));
        }
        let mut tree = BranchTree::new();
        tree.set_root_commit(record.commit);

        let mut seen = HashSet::from([MAIN_BRANCH.to_string()]);
        let mut pending: Vec<(BranchId, &BranchRecord)> = record
            .children
            .iter()
            .rev()
            .map(|child| (BranchId::ROOT, child))
            .collect();

        while let Some((parent, child)) = pending.pop() {
            validate_branch_name(&child.name)
                .map_err(|e| RefError::InvalidRecord(e.to_string()))?;
            if !seen.insert(child.name.clone()) {
                return Err(RefError::InvalidRecord(format!(
                    "branch {:?} appears more than once",
                    child.name
                )));
            }
            let id = tree.attach_restored(parent, child.name.clone(), child.commit)?;
            pending.extend(child.children.iter().rev().map(|grandchild| (id, grandchild)));
        }
        Ok(tree)
    }
}

impl Serialize for BranchTree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BranchTree {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = BranchRecord::deserialize(deserializer)?;
        BranchTree::from_record(&record).map_err(serde::de::Error::custom)
    }
}
