//! Access control for grove.
//!
//! - [`ContributorDirectory`] -- Unbalanced binary search tree of contributors and their roles
//! - [`PermissionRegistry`] -- Users in a height-balanced tree, each pointing at a shared role
//! - [`PermissionSet`] -- A role's permissions, itself a balanced tree
//! - [`AvlMap`] -- The AVL tree backing both of the above

pub mod avl;
pub mod contributors;
pub mod error;
pub mod permissions;

pub use avl::AvlMap;
pub use contributors::{Contributor, ContributorDirectory};
pub use error::{GateError, GateResult};
pub use permissions::{PermissionRegistry, PermissionSet, RolesRecord, UserGrant, UserRecord};
