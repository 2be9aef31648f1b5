// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog store trait
//!
//! Every catalog backend is an ordered byte-keyed map with one extra
//! primitive: a compare-and-swap on a single key. The catalog client builds
//! its atomic commit on that primitive alone.

use super::types::{CasOutcome, StorageResult, StorageType};

/// Key/value backend holding catalog state
pub trait KvStore: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Insert or overwrite a key/value pair
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &[u8]) -> StorageResult<()>;

    /// All entries whose key starts with `prefix`, in key order
    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + '_>>;

    /// Replace the value at `key` with `new` only if it currently equals
    /// `expected` (`None` meaning the key is absent)
    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StorageResult<CasOutcome>;

    /// Insert several entries in one backend write
    fn batch_insert(&self, entries: &[(&[u8], &[u8])]) -> StorageResult<()> {
        for (key, value) in entries {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Remove every key that starts with `prefix`, returning how many were removed
    fn remove_prefix(&self, prefix: &[u8]) -> StorageResult<usize> {
        let keys: Vec<Vec<u8>> = self
            .scan_prefix(prefix)?
            .map(|entry| entry.map(|(k, _)| k))
            .collect::<StorageResult<_>>()?;
        for key in &keys {
            self.remove(key)?;
        }
        Ok(keys.len())
    }

    /// Make pending writes durable
    fn flush(&self) -> StorageResult<()>;

    /// Backend kind
    fn storage_type(&self) -> StorageType;
}
