// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog client
//!
//! Every operation is scoped to the single ref the client was connected
//! with. Writes follow a stage-then-publish protocol:
//!
//! 1. `begin_write` reads the table pointer and remembers its exact bytes
//! 2. `stage_chunk` writes row chunks under a fresh snapshot id; nothing
//!    reachable from the ref points at them yet
//! 3. `publish` writes the snapshot metadata and swaps the pointer with one
//!    compare-and-swap against the remembered bytes
//!
//! Readers only ever follow the pointer, so they see either the old or the
//! new snapshot in full.

use super::error::{CatalogError, CatalogResult, VersionLabel};
use super::identity::{
    chunk_key, chunk_prefix, ref_key, snapshot_meta_key, snapshot_prefix, tables_prefix,
    validate_ref_name, TableIdentity, REFS_PREFIX,
};
use super::model::{
    decode_chunk, decode_record, encode_chunk, encode_record, RefInfo, Resolution,
    SnapshotEntry, SnapshotHandle, SnapshotMeta, TablePointer,
};
use crate::config::{CatalogDescriptor, DEFAULT_REF};
use crate::dataset::{Dataset, Row, Schema};
use crate::storage::{open_store, CasOutcome, KvStore};
use crate::writer::TableWriter;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// A snapshot being written but not yet visible. Consumed by
/// [`CatalogClient::publish`] or [`CatalogClient::discard`].
#[derive(Debug)]
pub struct StagedSnapshot {
    identity: TableIdentity,
    snapshot_id: Uuid,
    version: u64,
    schema: Schema,
    base_bytes: Option<Vec<u8>>,
    base_pointer: Option<TablePointer>,
    chunk_count: u32,
    row_count: u64,
    location: String,
}

impl StagedSnapshot {
    pub fn identity(&self) -> &TableIdentity {
        &self.identity
    }

    pub fn snapshot_id(&self) -> Uuid {
        self.snapshot_id
    }

    /// Version this snapshot will get if it wins the commit
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }
}

/// Client for one ref of a catalog store
pub struct CatalogClient {
    store: Arc<dyn KvStore>,
    reference: String,
    warehouse: String,
}

impl CatalogClient {
    /// Open the store named by the descriptor's URI and connect to its ref
    pub fn open(descriptor: &CatalogDescriptor) -> CatalogResult<Self> {
        let store = open_store(&descriptor.uri)?;
        Self::connect(descriptor, store)
    }

    /// Connect to the descriptor's ref on an already opened store.
    ///
    /// The default ref is created on first use; any other ref must exist.
    pub fn connect(descriptor: &CatalogDescriptor, store: Arc<dyn KvStore>) -> CatalogResult<Self> {
        validate_ref_name(&descriptor.reference)?;

        let client = Self {
            store,
            reference: descriptor.reference.clone(),
            warehouse: descriptor.warehouse.trim_end_matches('/').to_string(),
        };
        client.ensure_ref()?;

        info!(
            "Connected to {} catalog on ref '{}' (auth: {}, storage endpoint: {}, warehouse: {})",
            client.store.storage_type(),
            client.reference,
            descriptor.auth,
            descriptor.storage_endpoint,
            descriptor.warehouse
        );
        Ok(client)
    }

    fn ensure_ref(&self) -> CatalogResult<()> {
        let key = ref_key(&self.reference);
        if self.store.get(&key)?.is_some() {
            return Ok(());
        }
        if self.reference != DEFAULT_REF {
            return Err(CatalogError::RefNotFound(self.reference.clone()));
        }

        let info = RefInfo {
            name: self.reference.clone(),
            forked_from: None,
            created_at: Utc::now(),
        };
        if let CasOutcome::Swapped =
            self.store
                .compare_and_swap(&key, None, &encode_record(&info)?)?
        {
            self.store.flush()?;
            info!("Created default ref '{}'", self.reference);
        }
        Ok(())
    }

    /// The ref every operation of this client is bound to
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    fn load_pointer(
        &self,
        identity: &TableIdentity,
    ) -> CatalogResult<Option<(Vec<u8>, TablePointer)>> {
        let key = identity.pointer_key(&self.reference);
        match self.store.get(&key)? {
            Some(bytes) => {
                let pointer: TablePointer = decode_record(&key, &bytes)?;
                Ok(Some((bytes, pointer)))
            }
            None => Ok(None),
        }
    }

    fn require_pointer(&self, identity: &TableIdentity) -> CatalogResult<TablePointer> {
        self.load_pointer(identity)?
            .map(|(_, pointer)| pointer)
            .ok_or_else(|| self.table_not_found(identity))
    }

    fn load_meta(&self, snapshot_id: &Uuid) -> CatalogResult<SnapshotMeta> {
        let key = snapshot_meta_key(snapshot_id);
        let bytes = self
            .store
            .get(&key)?
            .ok_or_else(|| CatalogError::corrupted(&key, "referenced snapshot has no metadata"))?;
        decode_record(&key, &bytes)
    }

    fn table_not_found(&self, identity: &TableIdentity) -> CatalogError {
        CatalogError::TableNotFound {
            reference: self.reference.clone(),
            identity: identity.clone(),
        }
    }

    /// Current snapshot of a table on this ref, or `Absent`
    pub fn resolve(&self, identity: &TableIdentity) -> CatalogResult<Resolution> {
        let entry = match self.load_pointer(identity)? {
            Some((_, pointer)) => pointer.current().cloned(),
            None => None,
        };

        match entry {
            Some(entry) => {
                let meta = self.load_meta(&entry.snapshot_id)?;
                Ok(Resolution::CurrentSnapshot {
                    version: entry.version,
                    schema: meta.schema,
                })
            }
            None => Ok(Resolution::Absent),
        }
    }

    /// Start a create-or-replace of `identity` with `schema`
    pub fn begin_write(
        &self,
        identity: &TableIdentity,
        schema: &Schema,
    ) -> CatalogResult<StagedSnapshot> {
        let (base_bytes, base_pointer) = match self.load_pointer(identity)? {
            Some((bytes, pointer)) => (Some(bytes), Some(pointer)),
            None => (None, None),
        };
        let version = base_pointer
            .as_ref()
            .map(TablePointer::current_version)
            .unwrap_or(0)
            + 1;
        let snapshot_id = Uuid::new_v4();
        let location = format!("{}/{}/{}", self.warehouse, identity.path(), snapshot_id);

        debug!(
            "Staging {} version {} as snapshot {} on ref '{}'",
            identity, version, snapshot_id, self.reference
        );

        Ok(StagedSnapshot {
            identity: identity.clone(),
            snapshot_id,
            version,
            schema: schema.clone(),
            base_bytes,
            base_pointer,
            chunk_count: 0,
            row_count: 0,
            location,
        })
    }

    /// Stage one chunk of rows. Rows must match the staged schema.
    pub fn stage_chunk(&self, staged: &mut StagedSnapshot, rows: &[Row]) -> CatalogResult<()> {
        let key = chunk_key(&staged.snapshot_id, staged.chunk_count);
        self.store.insert(&key, &encode_chunk(rows)?)?;

        staged.chunk_count += 1;
        staged.row_count += rows.len() as u64;
        debug!(
            "Staged chunk {} ({} rows) of snapshot {}",
            staged.chunk_count - 1,
            rows.len(),
            staged.snapshot_id
        );
        Ok(())
    }

    /// Make a staged snapshot the table's current snapshot on this ref.
    ///
    /// Fails with `ConcurrentModification` if the pointer moved since
    /// `begin_write`; staged data is then removed and the ref is untouched.
    pub fn publish(&self, staged: StagedSnapshot) -> CatalogResult<SnapshotHandle> {
        let committed_at = Utc::now();
        let meta = SnapshotMeta {
            snapshot_id: staged.snapshot_id,
            identity: staged.identity.clone(),
            version: staged.version,
            schema: staged.schema.clone(),
            row_count: staged.row_count,
            chunk_count: staged.chunk_count,
            location: staged.location.clone(),
            committed_at,
        };

        let meta_write = encode_record(&meta).and_then(|bytes| {
            self.store
                .insert(&snapshot_meta_key(&meta.snapshot_id), &bytes)
                .map_err(CatalogError::from)
        });
        if let Err(e) = meta_write {
            self.discard(staged);
            return Err(e);
        }

        let mut pointer = staged.base_pointer.clone().unwrap_or_else(|| TablePointer {
            identity: staged.identity.clone(),
            history: Vec::new(),
        });
        pointer.history.push(SnapshotEntry {
            version: staged.version,
            snapshot_id: staged.snapshot_id,
            row_count: staged.row_count,
            committed_at,
        });
        let new_bytes = match encode_record(&pointer) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.discard(staged);
                return Err(e);
            }
        };

        let key = staged.identity.pointer_key(&self.reference);
        let outcome = match self
            .store
            .compare_and_swap(&key, staged.base_bytes.as_deref(), &new_bytes)
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // Whether the swap landed is unknown; leave staged data in place
                warn!(
                    "Pointer update for {} on ref '{}' failed: {}",
                    staged.identity, self.reference, e
                );
                return Err(e.into());
            }
        };

        match outcome {
            CasOutcome::Swapped => {
                // The commit is only acknowledged once the swap is on disk
                if let Err(e) = self.store.flush() {
                    warn!(
                        "Flushing {} version {} on ref '{}' failed: {}",
                        staged.identity, staged.version, self.reference, e
                    );
                    return Err(e.into());
                }
                info!(
                    "Committed {} version {} ({} rows, snapshot {}) on ref '{}'",
                    staged.identity,
                    staged.version,
                    staged.row_count,
                    staged.snapshot_id,
                    self.reference
                );
                Ok(SnapshotHandle {
                    reference: self.reference.clone(),
                    identity: staged.identity,
                    version: staged.version,
                    snapshot_id: staged.snapshot_id,
                    row_count: staged.row_count,
                    location: staged.location,
                    committed_at,
                })
            }
            CasOutcome::Conflict { current } => {
                let found = current
                    .as_deref()
                    .and_then(|bytes| decode_record::<TablePointer>(&key, bytes).ok())
                    .map(|p| p.current_version());
                let error = CatalogError::ConcurrentModification {
                    reference: self.reference.clone(),
                    identity: staged.identity.clone(),
                    expected: VersionLabel::from(
                        staged.base_pointer.as_ref().map(TablePointer::current_version),
                    ),
                    found: VersionLabel::from(found),
                };
                warn!("{}", error);
                self.discard(staged);
                Err(error)
            }
        }
    }

    /// Drop a staged snapshot's data. Best effort: leftovers are unreachable.
    pub fn discard(&self, staged: StagedSnapshot) {
        match self.store.remove_prefix(&snapshot_prefix(&staged.snapshot_id)) {
            Ok(removed) => debug!(
                "Discarded {} staged records of snapshot {}",
                removed, staged.snapshot_id
            ),
            Err(e) => warn!(
                "Failed to discard staged snapshot {}: {}",
                staged.snapshot_id, e
            ),
        }
    }

    /// Atomically create the table, or replace its current snapshot wholesale
    pub fn commit_create_or_replace(
        &self,
        identity: &TableIdentity,
        dataset: &Dataset,
    ) -> CatalogResult<SnapshotHandle> {
        TableWriter::new(self).write(identity, dataset)
    }

    /// Read a snapshot (the current one when `version` is `None`)
    pub fn read_snapshot(
        &self,
        identity: &TableIdentity,
        version: Option<u64>,
    ) -> CatalogResult<Dataset> {
        self.read_entry(identity, version).map(|(_, dataset)| dataset)
    }

    /// Read the current snapshot together with its history entry
    pub fn read_current(&self, identity: &TableIdentity) -> CatalogResult<(SnapshotEntry, Dataset)> {
        self.read_entry(identity, None)
    }

    fn read_entry(
        &self,
        identity: &TableIdentity,
        version: Option<u64>,
    ) -> CatalogResult<(SnapshotEntry, Dataset)> {
        let pointer = self.require_pointer(identity)?;
        let entry = match version {
            Some(version) => pointer.entry(version).ok_or_else(|| {
                CatalogError::SnapshotNotFound {
                    reference: self.reference.clone(),
                    identity: identity.clone(),
                    version,
                }
            })?,
            None => pointer
                .current()
                .ok_or_else(|| self.table_not_found(identity))?,
        };

        let meta = self.load_meta(&entry.snapshot_id)?;
        let prefix = chunk_prefix(&meta.snapshot_id);

        let mut rows = Vec::with_capacity(meta.row_count as usize);
        let mut chunks = 0u32;
        for item in self.store.scan_prefix(&prefix)? {
            let (key, bytes) = item?;
            rows.extend(decode_chunk(&key, &bytes)?);
            chunks += 1;
        }

        if chunks != meta.chunk_count || rows.len() as u64 != meta.row_count {
            return Err(CatalogError::corrupted(
                &snapshot_meta_key(&meta.snapshot_id),
                format!(
                    "expected {} rows in {} chunks, found {} rows in {} chunks",
                    meta.row_count,
                    meta.chunk_count,
                    rows.len(),
                    chunks
                ),
            ));
        }

        let dataset = Dataset::new(meta.schema, rows)
            .map_err(|e| CatalogError::corrupted(&snapshot_meta_key(&meta.snapshot_id), e))?;
        Ok((entry.clone(), dataset))
    }

    /// Version history of a table on this ref, oldest first
    pub fn history(&self, identity: &TableIdentity) -> CatalogResult<Vec<SnapshotEntry>> {
        Ok(self.require_pointer(identity)?.history)
    }

    /// Every table with at least one snapshot on this ref
    pub fn list_tables(&self) -> CatalogResult<Vec<TableIdentity>> {
        let prefix = tables_prefix(&self.reference);
        let mut tables = Vec::new();
        for item in self.store.scan_prefix(prefix.as_bytes())? {
            let (key, bytes) = item?;
            let pointer: TablePointer = decode_record(&key, &bytes)?;
            tables.push(pointer.identity);
        }
        tables.sort();
        Ok(tables)
    }

    /// Fork a new ref from `from`: every table pointer is copied, snapshots
    /// are shared
    pub fn create_ref(&self, name: &str, from: &str) -> CatalogResult<RefInfo> {
        validate_ref_name(name)?;
        let key = ref_key(name);
        if self.store.get(&ref_key(from))?.is_none() {
            return Err(CatalogError::RefNotFound(from.to_string()));
        }
        if self.store.get(&key)?.is_some() {
            return Err(CatalogError::RefAlreadyExists(name.to_string()));
        }

        // Copy pointers before the ref becomes visible, so a client that can
        // connect to the new ref always sees the forked tables
        let source_prefix = tables_prefix(from);
        let target_prefix = tables_prefix(name);
        let mut copies = Vec::new();
        for item in self.store.scan_prefix(source_prefix.as_bytes())? {
            let (source_key, bytes) = item?;
            let suffix = &source_key[source_prefix.len()..];
            let mut target_key = target_prefix.clone().into_bytes();
            target_key.extend_from_slice(suffix);
            copies.push((target_key, bytes));
        }
        let entries: Vec<(&[u8], &[u8])> = copies
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();
        self.store.batch_insert(&entries)?;

        let info = RefInfo {
            name: name.to_string(),
            forked_from: Some(from.to_string()),
            created_at: Utc::now(),
        };
        match self
            .store
            .compare_and_swap(&key, None, &encode_record(&info)?)?
        {
            CasOutcome::Swapped => {
                self.store.flush()?;
                info!(
                    "Created ref '{}' from '{}' with {} tables",
                    name,
                    from,
                    copies.len()
                );
                Ok(info)
            }
            CasOutcome::Conflict { .. } => Err(CatalogError::RefAlreadyExists(name.to_string())),
        }
    }

    /// All refs in the catalog
    pub fn list_refs(&self) -> CatalogResult<Vec<RefInfo>> {
        self.store
            .scan_prefix(REFS_PREFIX)?
            .map(|item| {
                let (key, bytes) = item?;
                decode_record::<RefInfo>(&key, &bytes)
            })
            .collect()
    }
}
