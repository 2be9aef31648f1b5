// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled catalog store

use super::traits::KvStore;
use super::types::{CasOutcome, StorageDriverError, StorageResult, StorageType};
use std::path::Path;

fn backend(e: sled::Error) -> StorageDriverError {
    StorageDriverError::BackendSpecific(e.to_string())
}

/// Sled store using the engine's native `compare_and_swap`
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path).map_err(backend)?;
        let tree = db.open_tree("catalog").map_err(backend)?;
        Ok(SledStore { db, tree })
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.tree.get(key).map_err(backend)?.map(|v| v.to_vec()))
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.tree.insert(key, value).map_err(backend)?;
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.tree.remove(key).map_err(backend)?;
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + '_>> {
        let iter = self.tree.scan_prefix(prefix).map(|result| {
            result
                .map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(backend)
        });
        Ok(Box::new(iter))
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StorageResult<CasOutcome> {
        match self
            .tree
            .compare_and_swap(key, expected, Some(new))
            .map_err(backend)?
        {
            Ok(()) => Ok(CasOutcome::Swapped),
            Err(conflict) => Ok(CasOutcome::Conflict {
                current: conflict.current.map(|v| v.to_vec()),
            }),
        }
    }

    fn batch_insert(&self, entries: &[(&[u8], &[u8])]) -> StorageResult<()> {
        let mut batch = sled::Batch::default();
        for (key, value) in entries {
            batch.insert(*key, *value);
        }
        self.tree.apply_batch(batch).map_err(backend)
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush().map_err(backend)?;
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Sled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sled_compare_and_swap() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::open(temp_dir.path()).unwrap();

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
    }

    #[test]
    fn test_sled_prefix_scan_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::open(temp_dir.path()).unwrap();

        store.insert(b"chunk/a/0", b"x").unwrap();
        store.insert(b"chunk/a/1", b"y").unwrap();
        store.insert(b"chunk/b/0", b"z").unwrap();

        assert_eq!(store.remove_prefix(b"chunk/a/").unwrap(), 2);
        assert_eq!(store.get(b"chunk/b/0").unwrap(), Some(b"z".to_vec()));
    }
}
