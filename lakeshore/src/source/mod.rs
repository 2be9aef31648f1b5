// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Source readers
//!
//! A source reader materializes one relation of an external tabular source
//! as a [`Dataset`]. Readers never write to the source.

mod sqlite;

pub use sqlite::SqliteReader;

use crate::config::SourceDescriptor;
use crate::dataset::Dataset;
use thiserror::Error;

/// Result type alias for source reads
pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The source could not be reached or opened
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Relation not found: {0}")]
    RelationNotFound(String),

    /// A column's type could not be mapped, or a cell did not fit it
    #[error("Schema inference failed: {0}")]
    SchemaInference(String),
}

/// Reads relations from one configured source
pub trait SourceReader {
    /// Materialize the current rows and schema of `relation`
    fn read(&self, relation: &str) -> SourceResult<Dataset>;
}

/// Build the reader for a descriptor's driver
pub fn open_reader(descriptor: &SourceDescriptor) -> SourceResult<Box<dyn SourceReader>> {
    match descriptor.driver.to_lowercase().as_str() {
        "sqlite" | "sqlite3" => Ok(Box::new(SqliteReader::new(descriptor))),
        other => Err(SourceError::SourceUnavailable(format!(
            "Unknown source driver: {}. Valid options: sqlite",
            other
        ))),
    }
}
