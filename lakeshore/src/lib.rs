// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lakeshore - catalog-backed ingestion
//!
//! Moves a relation from a relational source into a versioned, catalog
//! managed table and verifies the commit by reading it back.
//!
//! ```text
//! ┌──────────────┐   Dataset   ┌──────────────┐  stage + CAS  ┌───────────────┐
//! │ SourceReader │ ──────────▶ │ TableWriter  │ ────────────▶ │ CatalogClient │
//! └──────────────┘             └──────────────┘               └───────────────┘
//!                                                                     ▲
//!                              ┌──────────────┐  read_snapshot        │
//!                              │   Verifier   │ ──────────────────────┘
//!                              └──────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`dataset`] - Tabular values produced by sources
//! - [`source`] - Source readers (SQLite)
//! - [`storage`] - Catalog store backends (memory, redb, sled)
//! - [`catalog`] - Versioned catalog client
//! - [`writer`] - Atomic create-or-replace writes
//! - [`verify`] - Post-commit verification
//! - [`pipeline`] - The read → write → verify driver
//! - [`config`] - Per-run configuration

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod verify;
pub mod writer;

pub use catalog::{
    CatalogClient, CatalogError, CatalogResult, Resolution, SnapshotEntry, SnapshotHandle,
    TableIdentity,
};
pub use config::{AuthMode, CatalogDescriptor, Credentials, PipelineConfig, SourceDescriptor, WriteOptions};
pub use dataset::{Column, DataType, Dataset, Row, Schema, Value};
pub use pipeline::{Pipeline, PipelineError, PipelineFailure, PipelineState, RunReport, Stage};
pub use source::{open_reader, SourceError, SourceReader, SourceResult};
pub use verify::{MismatchDetail, Verifier, VerifyOutcome};
pub use writer::TableWriter;

/// Build a pipeline from `config` and run it to a terminal state
pub fn run_pipeline(config: PipelineConfig) -> Result<RunReport, PipelineFailure> {
    Pipeline::new(config).run()
}
