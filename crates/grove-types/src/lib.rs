//! Foundation types for grove.
//!
//! Every other grove crate depends on `grove-types`.
//!
//! # Key Types
//!
//! - [`Fingerprint`]: Fixed-width content digest (BLAKE3)
//! - [`CommitId`]: Commit identity with a short display form
//! - [`Timestamp`]: Wall-clock instant used for commits and pull requests
//! - [`Clock`]: Source of timestamps ([`SystemClock`], [`ManualClock`])

pub mod error;
pub mod fingerprint;
pub mod temporal;

pub use error::TypeError;
pub use fingerprint::{CommitId, Fingerprint, SHORT_ID_LEN};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
