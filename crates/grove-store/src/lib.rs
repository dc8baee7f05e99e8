//! Storage for grove.
//!
//! - [`BTreeIndex`] / [`ObjectIndex`]: the in-memory B-tree holding every
//!   file fingerprint ever committed.
//! - [`RecordStore`]: the durable, wholesale-rewritten record files that
//!   carry repository state between sessions.
//!
//! # Storage Backends
//!
//! - [`FileRecordStore`]: JSON files under `<root>/.grove/`
//! - [`InMemoryRecordStore`]: `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. A missing record is not an error: loaders see `Ok(None)`.
//! 2. Records are replaced whole; there is no partial update.
//! 3. File writes go through a temp file and an atomic rename.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod btree;
pub mod error;
pub mod file;
pub mod memory;
pub mod record;

pub use btree::{BTreeIndex, ObjectIndex, DEFAULT_MIN_DEGREE};
pub use error::{StoreError, StoreResult};
pub use file::{FileRecordStore, REPO_DIR_NAME};
pub use memory::InMemoryRecordStore;
pub use record::{load_record, save_record, RecordKind, RecordStore};
