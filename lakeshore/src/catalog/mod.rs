// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Versioned table catalog
//!
//! Tables are addressed by namespace + name on a named ref. Each commit
//! publishes one immutable snapshot; earlier snapshots stay readable by
//! version. The table pointer compare-and-swap is the only point where
//! concurrent writers are serialized.

mod client;
mod error;
mod identity;
mod model;

pub use client::{CatalogClient, StagedSnapshot};
pub use error::{CatalogError, CatalogResult, VersionLabel};
pub use identity::{validate_ref_name, TableIdentity};
pub use model::{RefInfo, Resolution, SnapshotEntry, SnapshotHandle, SnapshotMeta, TablePointer};
