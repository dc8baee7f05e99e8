//! Branch management for grove.
//!
//! Branches form an N-ary tree rooted at the permanent `main` branch. Each
//! branch may point at a commit. Nodes live in an arena and refer to each
//! other by [`BranchId`], so parent links need no reference cycles.

pub mod error;
pub mod names;
pub mod record;
pub mod tree;

pub use error::{RefError, RefResult};
pub use names::validate_branch_name;
pub use record::BranchRecord;
pub use tree::{BranchId, BranchNode, BranchTree, MAIN_BRANCH};
