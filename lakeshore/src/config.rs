// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Run configuration
//!
//! One [`PipelineConfig`] is built per run (from a JSON file, CLI flags or
//! both), validated once, and handed to each component's constructor. Nothing
//! here is process-global.

use crate::catalog::{validate_ref_name, TableIdentity};
use crate::storage::StoreLocation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_REF: &str = "main";
pub const DEFAULT_STORAGE_ENDPOINT: &str = "http://minio:9000";
pub const DEFAULT_WAREHOUSE: &str = "s3://warehouse/";
pub const DEFAULT_SOURCE_DRIVER: &str = "sqlite";
pub const DEFAULT_BATCH_ROWS: usize = 1024;
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// User/password pair for the source connection
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the dataset comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Endpoint URI understood by the driver (`sqlite://<path>` or a bare path)
    pub endpoint: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Relation (table or view) to read
    pub relation: String,
}

/// How the catalog authenticates callers
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    None,
    Bearer { token: String },
}

impl std::fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::None => write!(f, "None"),
            AuthMode::Bearer { .. } => write!(f, "Bearer(<redacted>)"),
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::None => write!(f, "none"),
            AuthMode::Bearer { .. } => write!(f, "bearer"),
        }
    }
}

/// Where committed tables go
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogDescriptor {
    /// `memory://`, `redb://<file>` or `sled://<dir>`
    pub uri: String,
    /// Every catalog operation of a run is bound to this ref
    #[serde(rename = "ref", default = "default_ref")]
    pub reference: String,
    #[serde(default)]
    pub auth: AuthMode,
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,
    /// Root under which snapshot data locations are recorded
    #[serde(default = "default_warehouse")]
    pub warehouse: String,
}

impl CatalogDescriptor {
    /// Descriptor with the default ref, auth, endpoint and warehouse
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            reference: default_ref(),
            auth: AuthMode::default(),
            storage_endpoint: default_storage_endpoint(),
            warehouse: default_warehouse(),
        }
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.uri
            .parse::<StoreLocation>()
            .map_err(ConfigError::Invalid)?;
        validate_ref_name(&self.reference).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let AuthMode::Bearer { token } = &self.auth {
            if token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "bearer authentication requires a non-empty token".to_string(),
                ));
            }
        }
        if self.warehouse.trim().is_empty() {
            return Err(ConfigError::Invalid("warehouse must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Table writer tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteOptions {
    /// Rows per staged chunk
    #[serde(default = "default_batch_rows")]
    pub batch_rows: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            batch_rows: DEFAULT_BATCH_ROWS,
        }
    }
}

/// Everything one pipeline run needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    pub source: SourceDescriptor,
    pub catalog: CatalogDescriptor,
    /// Destination table, `namespace.table`
    pub target: TableIdentity,
    #[serde(default)]
    pub write: WriteOptions,
    /// Rows kept for printing samples of the source and the committed table
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl PipelineConfig {
    pub fn new(source: SourceDescriptor, catalog: CatalogDescriptor, target: TableIdentity) -> Self {
        Self {
            source,
            catalog,
            target,
            write: WriteOptions::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    /// Load and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("source endpoint must not be empty".to_string()));
        }
        if self.source.relation.trim().is_empty() {
            return Err(ConfigError::Invalid("source relation must not be empty".to_string()));
        }
        if self.write.batch_rows == 0 {
            return Err(ConfigError::Invalid("write.batch_rows must be at least 1".to_string()));
        }
        self.catalog.validate()
    }
}

fn default_driver() -> String {
    DEFAULT_SOURCE_DRIVER.to_string()
}

fn default_ref() -> String {
    DEFAULT_REF.to_string()
}

fn default_storage_endpoint() -> String {
    DEFAULT_STORAGE_ENDPOINT.to_string()
}

fn default_warehouse() -> String {
    DEFAULT_WAREHOUSE.to_string()
}

fn default_batch_rows() -> usize {
    DEFAULT_BATCH_ROWS
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "source": { "endpoint": "sqlite:///data/mydb.sqlite", "relation": "sales_data" },
        "catalog": { "uri": "redb:///data/catalog.redb" },
        "target": "sales.sales_data"
    }"#;

    #[test]
    fn test_defaults_applied() {
        let config = PipelineConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.source.driver, "sqlite");
        assert_eq!(config.catalog.reference, "main");
        assert_eq!(config.catalog.auth, AuthMode::None);
        assert_eq!(config.catalog.warehouse, "s3://warehouse/");
        assert_eq!(config.catalog.storage_endpoint, "http://minio:9000");
        assert_eq!(config.write.batch_rows, DEFAULT_BATCH_ROWS);
        assert_eq!(config.preview_rows, DEFAULT_PREVIEW_ROWS);
        assert_eq!(config.target.to_string(), "sales.sales_data");
    }

    #[test]
    fn test_full_config() {
        let text = r#"{
            "source": {
                "endpoint": "/data/mydb.sqlite",
                "driver": "sqlite",
                "relation": "sales_data",
                "credentials": { "user": "myuser", "password": "mypassword" }
            },
            "catalog": {
                "uri": "sled:///data/catalog",
                "ref": "dev",
                "auth": { "type": "bearer", "token": "secret" }
            },
            "target": "sales.sales_data",
            "write": { "batch_rows": 10 },
            "preview_rows": 5
        }"#;
        let config = PipelineConfig::from_json(text).unwrap();
        assert_eq!(config.catalog.reference, "dev");
        assert_eq!(config.write.batch_rows, 10);

        let debug = format!("{:?}", config);
        assert!(!debug.contains("mypassword"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_invalid_configs() {
        let http = MINIMAL.replace("redb:///data/catalog.redb", "http://nessie:19120/api/v1");
        assert!(matches!(
            PipelineConfig::from_json(&http),
            Err(ConfigError::Invalid(_))
        ));

        let bad_target = MINIMAL.replace("sales.sales_data", "sales_data");
        assert!(matches!(
            PipelineConfig::from_json(&bad_target),
            Err(ConfigError::Parse(_))
        ));

        let mut config = PipelineConfig::from_json(MINIMAL).unwrap();
        config.write.batch_rows = 0;
        assert!(config.validate().is_err());

        config.write.batch_rows = 1;
        config.catalog.auth = AuthMode::Bearer {
            token: " ".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
