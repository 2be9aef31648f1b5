// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared fixtures for integration tests

#![allow(dead_code)]

use lakeshore::storage::{CasOutcome, KvStore, StorageDriverError, StorageResult, StorageType};
use lakeshore::{CatalogClient, CatalogDescriptor, DataType, Dataset, TableIdentity, Value};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

pub fn identity(text: &str) -> TableIdentity {
    TableIdentity::parse(text).expect("valid identity")
}

pub fn memory_client(store: Arc<dyn KvStore>) -> CatalogClient {
    CatalogClient::connect(&CatalogDescriptor::new("memory://"), store)
        .expect("Failed to connect catalog")
}

/// `(id INTEGER, name TEXT)` rows `(1,"a") .. (n, letter n)`
pub fn letters(n: usize) -> Dataset {
    let rows = (0..n)
        .map(|i| {
            vec![
                Value::Integer(i as i64 + 1),
                Value::Text(char::from(b'a' + (i % 26) as u8).to_string()),
            ]
        })
        .collect();
    Dataset::from_columns(&[("id", DataType::Integer), ("name", DataType::Text)], rows)
        .expect("valid dataset")
}

/// Create a SQLite database with a `sales_data` table and return its path
pub fn sales_database(dir: &Path) -> PathBuf {
    let path = dir.join("mydb.sqlite");
    let conn = Connection::open(&path).expect("Failed to create SQLite database");
    conn.execute_batch(
        "CREATE TABLE sales_data (
             sale_id INTEGER PRIMARY KEY,
             product TEXT NOT NULL,
             quantity INTEGER,
             price REAL,
             sold_on DATE
         );
         INSERT INTO sales_data VALUES (1, 'Widget', 10, 2.5, '2024-01-01');
         INSERT INTO sales_data VALUES (2, 'Gadget', 5, 10.0, '2024-01-02');
         INSERT INTO sales_data VALUES (3, 'Doohickey', NULL, 7.25, '2024-01-03');",
    )
    .expect("Failed to seed SQLite database");
    path
}

/// Counts every call that reaches the inner store
pub struct CountingStore {
    inner: Arc<dyn KvStore>,
    pub calls: AtomicUsize,
    pub flushes: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl KvStore for CountingStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.tick();
        self.inner.get(key)
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.tick();
        self.inner.insert(key, value)
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.tick();
        self.inner.remove(key)
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + '_>> {
        self.tick();
        self.inner.scan_prefix(prefix)
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StorageResult<CasOutcome> {
        self.tick();
        self.inner.compare_and_swap(key, expected, new)
    }

    fn flush(&self) -> StorageResult<()> {
        self.tick();
        self.flushes.fetch_add(1, Ordering::SeqCst);
        self.inner.flush()
    }

    fn storage_type(&self) -> StorageType {
        self.inner.storage_type()
    }
}

/// Where a [`FaultyStore`] fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail the n-th (0-based) chunk insert
    ChunkInsert(usize),
    /// Fail every table pointer compare-and-swap
    PointerSwap,
    /// Fail every flush
    Flush,
}

/// Injects a backend failure at a chosen point of a commit
pub struct FaultyStore {
    inner: Arc<dyn KvStore>,
    fault: Mutex<Option<Fault>>,
    chunk_inserts: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self {
            inner,
            fault: Mutex::new(None),
            chunk_inserts: AtomicUsize::new(0),
        }
    }

    pub fn arm(&self, fault: Fault) {
        self.chunk_inserts.store(0, Ordering::SeqCst);
        *self.fault.lock() = Some(fault);
    }

    pub fn disarm(&self) {
        *self.fault.lock() = None;
    }

    fn injected(what: &str) -> StorageDriverError {
        StorageDriverError::BackendSpecific(format!("injected failure during {}", what))
    }
}

fn is_chunk_key(key: &[u8]) -> bool {
    String::from_utf8_lossy(key).contains("/chunks/")
}

fn is_pointer_key(key: &[u8]) -> bool {
    key.starts_with(b"tables/")
}

impl KvStore for FaultyStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        if is_chunk_key(key) {
            let n = self.chunk_inserts.fetch_add(1, Ordering::SeqCst);
            if *self.fault.lock() == Some(Fault::ChunkInsert(n)) {
                return Err(Self::injected("chunk staging"));
            }
        }
        self.inner.insert(key, value)
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.inner.remove(key)
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + '_>> {
        self.inner.scan_prefix(prefix)
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StorageResult<CasOutcome> {
        if is_pointer_key(key) && *self.fault.lock() == Some(Fault::PointerSwap) {
            return Err(Self::injected("pointer swap"));
        }
        self.inner.compare_and_swap(key, expected, new)
    }

    fn flush(&self) -> StorageResult<()> {
        if *self.fault.lock() == Some(Fault::Flush) {
            return Err(Self::injected("flush"));
        }
        self.inner.flush()
    }

    fn storage_type(&self) -> StorageType {
        self.inner.storage_type()
    }
}

/// Holds every table pointer compare-and-swap at a barrier, so that all
/// racing writers have resolved the same base before any of them commits
pub struct BarrierStore {
    inner: Arc<dyn KvStore>,
    barrier: Barrier,
}

impl BarrierStore {
    pub fn new(inner: Arc<dyn KvStore>, writers: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(writers),
        }
    }
}

impl KvStore for BarrierStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.inner.insert(key, value)
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.inner.remove(key)
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + '_>> {
        self.inner.scan_prefix(prefix)
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StorageResult<CasOutcome> {
        if is_pointer_key(key) {
            self.barrier.wait();
        }
        self.inner.compare_and_swap(key, expected, new)
    }

    fn flush(&self) -> StorageResult<()> {
        self.inner.flush()
    }

    fn storage_type(&self) -> StorageType {
        self.inner.storage_type()
    }
}

/// Runs a one-shot hook right after the first successful table pointer swap
pub struct AfterCommitStore {
    inner: Arc<dyn KvStore>,
    hook: Mutex<Option<Box<dyn FnOnce(Arc<dyn KvStore>) + Send>>>,
}

impl AfterCommitStore {
    pub fn new(inner: Arc<dyn KvStore>, hook: Box<dyn FnOnce(Arc<dyn KvStore>) + Send>) -> Self {
        Self {
            inner,
            hook: Mutex::new(Some(hook)),
        }
    }
}

impl KvStore for AfterCommitStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.inner.insert(key, value)
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.inner.remove(key)
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + '_>> {
        self.inner.scan_prefix(prefix)
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StorageResult<CasOutcome> {
        let outcome = self.inner.compare_and_swap(key, expected, new)?;
        if is_pointer_key(key) && outcome == CasOutcome::Swapped {
            let hook = self.hook.lock().take();
            if let Some(hook) = hook {
                hook(self.inner.clone());
            }
        }
        Ok(outcome)
    }

    fn flush(&self) -> StorageResult<()> {
        self.inner.flush()
    }

    fn storage_type(&self) -> StorageType {
        self.inner.storage_type()
    }
}
