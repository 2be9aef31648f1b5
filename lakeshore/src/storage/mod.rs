// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog storage backends
//!
//! This module provides:
//! - The `KvStore` trait every catalog backend implements
//! - In-memory, redb and sled implementations
//! - URI based backend selection (`memory://`, `redb://<file>`, `sled://<dir>`)

mod memory;
#[cfg(feature = "redb-backend")]
mod redb;
#[cfg(feature = "sled-backend")]
mod sled;
mod traits;
mod types;

pub use memory::MemoryStore;
#[cfg(feature = "redb-backend")]
pub use self::redb::RedbStore;
#[cfg(feature = "sled-backend")]
pub use self::sled::SledStore;
pub use traits::KvStore;
pub use types::{CasOutcome, StorageDriverError, StorageResult, StorageType, StoreLocation};

use log::info;
use std::sync::Arc;

/// Open the catalog store a URI points at
pub fn open_store(uri: &str) -> StorageResult<Arc<dyn KvStore>> {
    let location: StoreLocation = uri
        .parse()
        .map_err(StorageDriverError::UnsupportedLocation)?;

    info!(
        "Opening {} catalog store{}",
        location.storage_type,
        location
            .path
            .as_ref()
            .map(|p| format!(" at {}", p.display()))
            .unwrap_or_default()
    );

    match (location.storage_type, location.path) {
        (StorageType::Memory, _) => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "redb-backend")]
        (StorageType::Redb, Some(path)) => Ok(Arc::new(RedbStore::open(path)?)),
        #[cfg(feature = "sled-backend")]
        (StorageType::Sled, Some(path)) => Ok(Arc::new(SledStore::open(path)?)),
        (storage_type, _) => Err(StorageDriverError::UnsupportedLocation(format!(
            "{} backend is not available in this build",
            storage_type
        ))),
    }
}
