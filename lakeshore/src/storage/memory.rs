// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory catalog store

use super::traits::KvStore;
use super::types::{CasOutcome, StorageResult, StorageType};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Ordered map behind a lock. Compare-and-swap runs under the write lock, so
/// racing writers in one process are serialized.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + '_>> {
        // Snapshot the matching range so the lock is not held by the iterator
        let items: Vec<StorageResult<(Vec<u8>, Vec<u8>)>> = self
            .entries
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();

        Ok(Box::new(items.into_iter()))
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StorageResult<CasOutcome> {
        let mut entries = self.entries.write();
        let current = entries.get(key).map(Vec::as_slice);

        if current != expected {
            return Ok(CasOutcome::Conflict {
                current: current.map(<[u8]>::to_vec),
            });
        }

        entries.insert(key.to_vec(), new.to_vec());
        Ok(CasOutcome::Swapped)
    }

    fn batch_insert(&self, entries: &[(&[u8], &[u8])]) -> StorageResult<()> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert(key.to_vec(), value.to_vec());
        }
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_basic_operations() {
        let store = MemoryStore::new();
        store.insert(b"key1", b"value1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));

        store.remove(b"key1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_prefix_scan() {
        let store = MemoryStore::new();
        store.insert(b"user:1", b"alice").unwrap();
        store.insert(b"user:2", b"bob").unwrap();
        store.insert(b"post:1", b"hello").unwrap();

        let items: Vec<_> = store
            .scan_prefix(b"user:")
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].1, b"alice".to_vec());

        assert_eq!(store.remove_prefix(b"user:").unwrap(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_compare_and_swap() {
        let store = MemoryStore::new();

        assert_eq!(
            store.compare_and_swap(b"ptr", None, b"v1").unwrap(),
            CasOutcome::Swapped
        );
        assert_eq!(
            store.compare_and_swap(b"ptr", None, b"v2").unwrap(),
            CasOutcome::Conflict {
                current: Some(b"v1".to_vec())
            }
        );
        assert_eq!(
            store.compare_and_swap(b"ptr", Some(b"v1"), b"v2").unwrap(),
            CasOutcome::Swapped
        );
        assert_eq!(store.get(b"ptr").unwrap(), Some(b"v2".to_vec()));
    }
}
