// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog records
//!
//! Three kinds of record live in the store:
//! - `refs/{ref}`: [`RefInfo`]
//! - `tables/{ref}/{identity}`: [`TablePointer`], the only record ever
//!   replaced, always through compare-and-swap
//! - `snapshots/{id}/...`: [`SnapshotMeta`] plus data chunks, written once
//!   before the pointer that references them is published

use super::error::{CatalogError, CatalogResult};
use super::identity::TableIdentity;
use crate::storage::StorageDriverError;
use crate::dataset::{Row, Schema};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// A named branch of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefInfo {
    pub name: String,
    /// Ref this one was forked from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forked_from: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One entry of a table's version history on a ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub version: u64,
    pub snapshot_id: Uuid,
    pub row_count: u64,
    pub committed_at: DateTime<Utc>,
}

/// Version history of one table on one ref. The last entry is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePointer {
    pub identity: TableIdentity,
    pub history: Vec<SnapshotEntry>,
}

impl TablePointer {
    pub fn current(&self) -> Option<&SnapshotEntry> {
        self.history.last()
    }

    pub fn current_version(&self) -> u64 {
        self.current().map(|e| e.version).unwrap_or(0)
    }

    pub fn entry(&self, version: u64) -> Option<&SnapshotEntry> {
        self.history.iter().find(|e| e.version == version)
    }
}

/// Schema and layout of one immutable snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub snapshot_id: Uuid,
    pub identity: TableIdentity,
    pub version: u64,
    pub schema: Schema,
    pub row_count: u64,
    pub chunk_count: u32,
    /// Warehouse location of the snapshot's data
    pub location: String,
    pub committed_at: DateTime<Utc>,
}

/// Returned by a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    pub reference: String,
    pub identity: TableIdentity,
    pub version: u64,
    pub snapshot_id: Uuid,
    pub row_count: u64,
    pub location: String,
    pub committed_at: DateTime<Utc>,
}

/// Current state of a table on the client's ref
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Absent,
    CurrentSnapshot { version: u64, schema: Schema },
}

impl Resolution {
    pub fn version(&self) -> Option<u64> {
        match self {
            Resolution::Absent => None,
            Resolution::CurrentSnapshot { version, .. } => Some(*version),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Resolution::Absent)
    }
}

/// Rows of one staged chunk with a checksum over the encoded rows
#[derive(Debug, Serialize, Deserialize)]
struct ChunkRecord {
    checksum: u32,
    payload: Vec<u8>,
}

pub(crate) fn encode_chunk(rows: &[Row]) -> CatalogResult<Vec<u8>> {
    let payload = bincode::serialize(rows).map_err(StorageDriverError::from)?;
    let record = ChunkRecord {
        checksum: crc32fast::hash(&payload),
        payload,
    };
    Ok(bincode::serialize(&record).map_err(StorageDriverError::from)?)
}

pub(crate) fn decode_chunk(key: &[u8], bytes: &[u8]) -> CatalogResult<Vec<Row>> {
    let record: ChunkRecord =
        bincode::deserialize(bytes).map_err(|e| CatalogError::corrupted(key, e))?;

    let actual = crc32fast::hash(&record.payload);
    if actual != record.checksum {
        return Err(CatalogError::corrupted(
            key,
            format!(
                "checksum mismatch: stored {:08x}, computed {:08x}",
                record.checksum, actual
            ),
        ));
    }

    bincode::deserialize(&record.payload).map_err(|e| CatalogError::corrupted(key, e))
}

pub(crate) fn encode_record<T: Serialize>(record: &T) -> CatalogResult<Vec<u8>> {
    Ok(serde_json::to_vec(record).map_err(StorageDriverError::from)?)
}

pub(crate) fn decode_record<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> CatalogResult<T> {
    serde_json::from_slice(bytes).map_err(|e| CatalogError::corrupted(key, e))
}
