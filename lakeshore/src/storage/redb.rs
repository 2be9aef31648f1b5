// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! REDB catalog store

use super::traits::KvStore;
use super::types::{CasOutcome, StorageDriverError, StorageResult, StorageType};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// All catalog keys live in one table
const CATALOG_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("catalog");

fn backend<E: std::fmt::Display>(e: E) -> StorageDriverError {
    StorageDriverError::BackendSpecific(e.to_string())
}

/// REDB store. Write transactions are serialized by redb, which makes the
/// read-compare-write inside one transaction a true compare-and-swap across
/// threads sharing the handle.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        // REDB requires a file path, not a directory
        let db_path = if path.as_ref().is_dir() {
            path.as_ref().join("catalog.redb")
        } else {
            path.as_ref().to_path_buf()
        };

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(&db_path).map_err(backend)?;

        // Make sure the table exists so readers never see TableDoesNotExist
        let write_txn = db.begin_write().map_err(backend)?;
        {
            let _ = write_txn.open_table(CATALOG_TABLE).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        Ok(RedbStore { db: Arc::new(db) })
    }
}

impl KvStore for RedbStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(CATALOG_TABLE).map_err(backend)?;

        let result = table.get(key).map_err(backend)?;
        Ok(result.map(|guard| guard.value().to_vec()))
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(CATALOG_TABLE).map_err(backend)?;
            table.insert(key, value).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(CATALOG_TABLE).map_err(backend)?;
            table.remove(key).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + '_>> {
        // REDB's iterators are tied to the read transaction, so collect
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(CATALOG_TABLE).map_err(backend)?;

        let items: Vec<StorageResult<(Vec<u8>, Vec<u8>)>> = table
            .iter()
            .map_err(backend)?
            .map(|result| {
                result
                    .map(|(k, v)| (k.value().to_vec(), v.value().to_vec()))
                    .map_err(backend)
            })
            .filter(|result| match result {
                Ok((key, _)) => key.starts_with(prefix),
                Err(_) => true,
            })
            .collect();

        Ok(Box::new(items.into_iter()))
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StorageResult<CasOutcome> {
        let write_txn = self.db.begin_write().map_err(backend)?;

        let outcome = {
            let mut table = write_txn.open_table(CATALOG_TABLE).map_err(backend)?;
            let current = table
                .get(key)
                .map_err(backend)?
                .map(|guard| guard.value().to_vec());

            if current.as_deref() == expected {
                table.insert(key, new).map_err(backend)?;
                CasOutcome::Swapped
            } else {
                CasOutcome::Conflict { current }
            }
        };

        match outcome {
            CasOutcome::Swapped => write_txn.commit().map_err(backend)?,
            CasOutcome::Conflict { .. } => write_txn.abort().map_err(backend)?,
        }

        Ok(outcome)
    }

    fn batch_insert(&self, entries: &[(&[u8], &[u8])]) -> StorageResult<()> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(CATALOG_TABLE).map_err(backend)?;
            for (key, value) in entries {
                table.insert(*key, *value).map_err(backend)?;
            }
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        // Every committed write transaction is already durable
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Redb
    }
}
