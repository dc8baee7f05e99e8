//! Branch merge reports for grove.
//!
//! A merge compares the file sets recorded on two branches' commits and
//! classifies every path as added, removed, modified or unchanged. Files that
//! exist on only one side get a unified diff body sourced from the working
//! tree. Commits record fingerprints, not content, so a file modified between
//! the two sides has only one version available and is reported without a
//! body, even when the working copy is readable. Nothing is written: a report
//! describes a merge, it does not perform one.

pub mod error;
pub mod report;

pub use error::{MergeError, MergeResult};
pub use report::{build_merge_report, FileMerge, MergeChange, MergeReport};
