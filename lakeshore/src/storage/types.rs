// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog store types and error handling
//!
//! This module defines the backend selector, the compare-and-swap outcome and
//! the error type shared by every catalog store implementation.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::PathBuf;

/// Catalog store backend
///
/// Specifies which underlying key/value engine holds catalog state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StorageType {
    /// Sled - Pure Rust embedded database with native compare-and-swap
    Sled,

    /// Redb - Pure Rust ACID-compliant embedded database
    /// Best for: crash-safety, serialized write transactions
    #[default]
    Redb,

    /// Memory - In-process storage, lost on drop
    /// Best for: Unit testing, single-process dry runs
    Memory,
}

impl std::str::FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageType::Sled),
            "redb" => Ok(StorageType::Redb),
            "memory" => Ok(StorageType::Memory),
            _ => Err(format!(
                "Unknown storage type: {}. Valid options: sled, redb, memory",
                s
            )),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageType::Sled => "sled",
            StorageType::Redb => "redb",
            StorageType::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// Parsed catalog URI: `memory://`, `redb://<file>` or `sled://<dir>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    pub storage_type: StorageType,
    pub path: Option<PathBuf>,
}

impl std::str::FromStr for StoreLocation {
    type Err = String;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| format!("Catalog URI '{}' has no scheme", uri))?;

        let storage_type: StorageType = scheme.parse().map_err(|_| {
            format!(
                "Unsupported catalog URI scheme '{}'. Valid options: memory, redb, sled",
                scheme
            )
        })?;

        let path = match storage_type {
            StorageType::Memory => None,
            _ if rest.is_empty() => {
                return Err(format!("Catalog URI '{}' is missing a path", uri));
            }
            _ => Some(PathBuf::from(rest)),
        };

        Ok(StoreLocation { storage_type, path })
    }
}

/// Result of a compare-and-swap on a single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// The expected value matched and the new value is now visible
    Swapped,
    /// Another writer got there first; nothing was written
    Conflict { current: Option<Vec<u8>> },
}

/// Error type for catalog store operations
#[derive(Debug)]
pub enum StorageDriverError {
    /// I/O related errors (file system, network, etc.)
    IoError(std::io::Error),

    /// Data serialization failed
    SerializationError(String),

    /// The catalog URI could not be mapped to a backend
    UnsupportedLocation(String),

    /// Driver-specific error (Sled, Redb, ...)
    BackendSpecific(String),
}

impl std::fmt::Display for StorageDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageDriverError::IoError(e) => write!(f, "I/O error: {}", e),
            StorageDriverError::SerializationError(e) => write!(f, "Serialization error: {}", e),
            StorageDriverError::UnsupportedLocation(e) => write!(f, "Unsupported location: {}", e),
            StorageDriverError::BackendSpecific(e) => write!(f, "Storage driver error: {}", e),
        }
    }
}

impl std::error::Error for StorageDriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageDriverError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for StorageDriverError {
    fn from(e: std::io::Error) -> Self {
        StorageDriverError::IoError(e)
    }
}

impl From<bincode::Error> for StorageDriverError {
    fn from(e: bincode::Error) -> Self {
        StorageDriverError::SerializationError(e.to_string())
    }
}

impl From<serde_json::Error> for StorageDriverError {
    fn from(e: serde_json::Error) -> Self {
        StorageDriverError::SerializationError(e.to_string())
    }
}

/// Result type for catalog store operations
pub type StorageResult<T> = Result<T, StorageDriverError>;
