//! Commit history for grove.
//!
//! This crate provides:
//! - [`Commit`] records whose identity is derived from their content
//! - [`CommitChain`], the append-only, parent-linked history
//! - Commit lookup by short id, full id or unambiguous prefix
//! - Redundant-commit detection and whole-chain validation

pub mod chain;
pub mod commit;
pub mod error;

pub use chain::{CommitChain, MIN_PREFIX_LEN};
pub use commit::{Commit, CommitFile};
pub use error::{LedgerError, LedgerResult};
