// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog error types

use super::identity::TableIdentity;
use crate::storage::StorageDriverError;
use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Failures surfaced by the catalog client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// The backing store failed; safe to retry
    #[error("Catalog unreachable: {0}")]
    CatalogUnreachable(String),

    /// Another commit moved the table pointer after this write resolved it.
    /// Retrying requires resolving the table again.
    #[error(
        "Concurrent modification of {identity} on ref '{reference}': expected base version {expected}, found {found}"
    )]
    ConcurrentModification {
        reference: String,
        identity: TableIdentity,
        expected: VersionLabel,
        found: VersionLabel,
    },

    #[error("Table not found: {identity} on ref '{reference}'")]
    TableNotFound {
        reference: String,
        identity: TableIdentity,
    },

    #[error("Snapshot version {version} of {identity} not found on ref '{reference}'")]
    SnapshotNotFound {
        reference: String,
        identity: TableIdentity,
        version: u64,
    },

    #[error("Ref not found: {0}")]
    RefNotFound(String),

    #[error("Ref already exists: {0}")]
    RefAlreadyExists(String),

    /// A stored catalog record failed its checksum or could not be decoded
    #[error("Corrupted catalog record {key}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Invalid name: {0}")]
    InvalidName(String),
}

impl CatalogError {
    /// Whether retrying the same call unchanged may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::CatalogUnreachable(_))
    }

    pub(crate) fn corrupted(key: &[u8], reason: impl ToString) -> Self {
        CatalogError::Corrupted {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: reason.to_string(),
        }
    }
}

impl From<StorageDriverError> for CatalogError {
    fn from(e: StorageDriverError) -> Self {
        CatalogError::CatalogUnreachable(e.to_string())
    }
}

/// Table version as seen by a writer: a concrete version or "absent"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLabel {
    Absent,
    Version(u64),
}

impl From<Option<u64>> for VersionLabel {
    fn from(v: Option<u64>) -> Self {
        match v {
            Some(v) => VersionLabel::Version(v),
            None => VersionLabel::Absent,
        }
    }
}

impl std::fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionLabel::Absent => write!(f, "absent"),
            VersionLabel::Version(v) => write!(f, "{}", v),
        }
    }
}
