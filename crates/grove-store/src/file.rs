//! File-backed record store.
//!
//! Each record lives at `<root>/.grove/<kind>.json`. A write goes to a
//! temporary file in the same directory which is then renamed over the
//! record, so readers see either the old record or the new one, never a torn
//! write. Records are still written one at a time; a crash between two
//! record writes can leave them mutually inconsistent.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::record::{RecordKind, RecordStore};

/// Name of the repository metadata directory under the working root.
pub const REPO_DIR_NAME: &str = ".grove";

/// Record store writing JSON files under a repository root.
#[derive(Clone, Debug)]
pub struct FileRecordStore {
    root: PathBuf,
}

impl FileRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The working root this store belongs to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.grove` directory.
    pub fn repo_dir(&self) -> PathBuf {
        self.root.join(REPO_DIR_NAME)
    }

    /// Path of the file holding `kind`.
    pub fn record_path(&self, kind: RecordKind) -> PathBuf {
        self.repo_dir().join(format!("{}.json", kind.name()))
    }
}

impl RecordStore for FileRecordStore {
    fn is_initialized(&self) -> StoreResult<bool> {
        Ok(self.repo_dir().is_dir())
    }

    fn initialize(&self) -> StoreResult<bool> {
        let dir = self.repo_dir();
        if dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&dir)?;
        info!(path = %dir.display(), "created repository directory");
        Ok(true)
    }

    fn read_record(&self, kind: RecordKind) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.record_path(kind)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(&self, kind: RecordKind, data: &[u8]) -> StoreResult<()> {
        let dir = self.repo_dir();
        if !dir.is_dir() {
            return Err(StoreError::NotInitialized);
        }
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.record_path(kind)).map_err(|e| e.error)?;
        debug!(record = %kind, bytes = data.len(), "record written");
        Ok(())
    }
}
