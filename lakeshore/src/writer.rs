// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Table writer
//!
//! Sequences one create-or-replace as a single logical operation: rows are
//! staged in chunks of `WriteOptions::batch_rows`, then the catalog pointer is
//! published exactly once. Any failure before publication discards the staged
//! data and leaves the table as it was.

use crate::catalog::{CatalogClient, CatalogResult, SnapshotHandle, TableIdentity};
use crate::config::WriteOptions;
use crate::dataset::Dataset;
use log::{debug, info};
use std::time::Instant;

pub struct TableWriter<'a> {
    catalog: &'a CatalogClient,
    options: WriteOptions,
}

impl<'a> TableWriter<'a> {
    pub fn new(catalog: &'a CatalogClient) -> Self {
        Self::with_options(catalog, WriteOptions::default())
    }

    pub fn with_options(catalog: &'a CatalogClient, options: WriteOptions) -> Self {
        Self { catalog, options }
    }

    /// Create `identity` from `dataset`, or replace its current snapshot.
    ///
    /// Catalog failures are returned unchanged.
    pub fn write(&self, identity: &TableIdentity, dataset: &Dataset) -> CatalogResult<SnapshotHandle> {
        let started = Instant::now();
        let batch_rows = self.options.batch_rows.max(1);

        let mut staged = self.catalog.begin_write(identity, dataset.schema())?;

        for rows in dataset.rows().chunks(batch_rows) {
            if let Err(e) = self.catalog.stage_chunk(&mut staged, rows) {
                self.catalog.discard(staged);
                return Err(e);
            }
        }

        // An empty dataset still gets one (empty) chunk so every snapshot has data
        if staged.chunk_count() == 0 {
            if let Err(e) = self.catalog.stage_chunk(&mut staged, &[]) {
                self.catalog.discard(staged);
                return Err(e);
            }
        }

        debug!(
            "Staged {} rows in {} chunks for {}",
            staged.row_count(),
            staged.chunk_count(),
            identity
        );

        let handle = self.catalog.publish(staged)?;

        info!(
            "Wrote {} rows to {} version {} in {:.2} ms",
            handle.row_count,
            identity,
            handle.version,
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogDescriptor;
    use crate::dataset::{DataType, Value};
    use crate::storage::{KvStore, MemoryStore};
    use std::sync::Arc;

    fn numbers(n: i64) -> Dataset {
        Dataset::from_columns(
            &[("n", DataType::Integer)],
            (0..n).map(|i| vec![Value::Integer(i)]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_rows_staged_in_batches() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let client = CatalogClient::connect(&CatalogDescriptor::new("memory://"), store).unwrap();
        let identity = TableIdentity::parse("test.numbers").unwrap();

        let writer = TableWriter::with_options(&client, WriteOptions { batch_rows: 4 });
        let handle = writer.write(&identity, &numbers(10)).unwrap();
        assert_eq!(handle.row_count, 10);

        let read = client.read_snapshot(&identity, None).unwrap();
        assert_eq!(read.rows(), numbers(10).rows());
    }

    #[test]
    fn test_empty_dataset_round_trips() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let client = CatalogClient::connect(&CatalogDescriptor::new("memory://"), store).unwrap();
        let identity = TableIdentity::parse("test.empty").unwrap();

        let handle = TableWriter::new(&client).write(&identity, &numbers(0)).unwrap();
        assert_eq!(handle.version, 1);

        let read = client.read_snapshot(&identity, None).unwrap();
        assert_eq!(read.row_count(), 0);
        assert_eq!(read.schema().column_names(), vec!["n"]);
    }
}
