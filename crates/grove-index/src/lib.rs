//! Staging area for grove.
//!
//! Tracks the files prepared for the next commit, detects changes via content
//! fingerprints, and computes working directory status.
//!
//! # Key Types
//!
//! - [`StagingArea`] -- Ordered, duplicate-free staging entries
//! - [`StagingEntry`] / [`ChangeKind`] -- A staged file and whether it is new or modified
//! - [`FileProbe`] -- Read access to the working tree ([`WorkdirProbe`], [`InMemoryWorkdir`])
//! - [`WorkdirStatus`] -- Result of status computation

pub mod entry;
pub mod error;
pub mod probe;
pub mod staging;
pub mod status;

pub use entry::{ChangeKind, StageOutcome, StagingEntry};
pub use error::{IndexError, IndexResult};
pub use probe::{normalize_path, FileProbe, InMemoryWorkdir, WorkdirProbe};
pub use staging::StagingArea;
pub use status::WorkdirStatus;
