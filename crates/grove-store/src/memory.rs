use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::record::{RecordKind, RecordStore};

/// In-memory record store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock` and
/// are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    initialized: RwLock<bool>,
    records: RwLock<HashMap<RecordKind, Vec<u8>>>,
}

impl InMemoryRecordStore {
    /// Create an empty, uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that is already initialized.
    pub fn initialized() -> Self {
        let store = Self::new();
        *store.initialized.write().expect("lock poisoned") = true;
        store
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn is_initialized(&self) -> StoreResult<bool> {
        Ok(*self.initialized.read().expect("lock poisoned"))
    }

    fn initialize(&self) -> StoreResult<bool> {
        let mut initialized = self.initialized.write().expect("lock poisoned");
        let created = !*initialized;
        *initialized = true;
        Ok(created)
    }

    fn read_record(&self, kind: RecordKind) -> StoreResult<Option<Vec<u8>>> {
        let records = self.records.read().expect("lock poisoned");
        Ok(records.get(&kind).cloned())
    }

    fn write_record(&self, kind: RecordKind, data: &[u8]) -> StoreResult<()> {
        if !self.is_initialized()? {
            return Err(StoreError::NotInitialized);
        }
        let mut records = self.records.write().expect("lock poisoned");
        records.insert(kind, data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_reports_first_time_only() {
        let store = InMemoryRecordStore::new();
        assert!(!store.is_initialized().unwrap());
        assert!(store.initialize().unwrap());
        assert!(!store.initialize().unwrap());
        assert!(store.is_initialized().unwrap());
    }

    #[test]
    fn write_requires_initialization() {
        let store = InMemoryRecordStore::new();
        let err = store.write_record(RecordKind::Commits, b"[]").unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized));
        assert!(store.is_empty());
    }

    #[test]
    fn write_replaces_record() {
        let store = InMemoryRecordStore::initialized();
        store.write_record(RecordKind::Staging, b"one").unwrap();
        store.write_record(RecordKind::Staging, b"two").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.read_record(RecordKind::Staging).unwrap(),
            Some(b"two".to_vec())
        );
    }
}
