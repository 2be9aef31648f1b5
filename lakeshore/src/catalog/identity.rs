// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Table identities and catalog key layout
//!
//! A table is addressed by `(ref, namespace, name)`. The ref part is owned by
//! the catalog client, so [`TableIdentity`] only carries namespace and name.
//! Textual form: `ns1.ns2.table`.

use super::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};

/// Namespace + table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableIdentity {
    namespace: Vec<String>,
    name: String,
}

fn validate_segment(kind: &str, segment: &str) -> CatalogResult<()> {
    if segment.is_empty() {
        return Err(CatalogError::InvalidName(format!("{} must not be empty", kind)));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| *c == '.' || *c == '/' || c.is_control())
    {
        return Err(CatalogError::InvalidName(format!(
            "{} '{}' contains forbidden character {:?}",
            kind, segment, c
        )));
    }
    Ok(())
}

/// Ref names follow the same rules as identity segments, except that dots
/// are allowed (`release-1.2`)
pub fn validate_ref_name(name: &str) -> CatalogResult<()> {
    if name.is_empty() || name.chars().any(|c| c == '/' || c.is_control() || c.is_whitespace()) {
        return Err(CatalogError::InvalidName(format!(
            "'{}' is not a valid ref name",
            name
        )));
    }
    Ok(())
}

impl TableIdentity {
    pub fn new<I, S>(namespace: I, name: impl Into<String>) -> CatalogResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let namespace: Vec<String> = namespace.into_iter().map(Into::into).collect();
        let name = name.into();

        if namespace.is_empty() {
            return Err(CatalogError::InvalidName(format!(
                "table '{}' needs a namespace",
                name
            )));
        }
        for segment in &namespace {
            validate_segment("namespace", segment)?;
        }
        validate_segment("table name", &name)?;

        Ok(Self { namespace, name })
    }

    /// Parse `ns1.ns2.table`; the last segment is the table name
    pub fn parse(text: &str) -> CatalogResult<Self> {
        let mut segments: Vec<&str> = text.split('.').collect();
        let name = segments.pop().unwrap_or_default();
        Self::new(segments, name)
    }

    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace path with `/` separators, used for warehouse locations
    pub fn path(&self) -> String {
        format!("{}/{}", self.namespace.join("/"), self.name)
    }

    /// Key of the table pointer on `reference`
    pub(crate) fn pointer_key(&self, reference: &str) -> Vec<u8> {
        format!("{}{}", tables_prefix(reference), self).into_bytes()
    }
}

impl std::fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace.join("."), self.name)
    }
}

impl std::str::FromStr for TableIdentity {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TableIdentity {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TableIdentity> for String {
    fn from(identity: TableIdentity) -> Self {
        identity.to_string()
    }
}

pub(crate) fn ref_key(reference: &str) -> Vec<u8> {
    format!("refs/{}", reference).into_bytes()
}

pub(crate) const REFS_PREFIX: &[u8] = b"refs/";

pub(crate) fn tables_prefix(reference: &str) -> String {
    format!("tables/{}/", reference)
}

pub(crate) fn snapshot_meta_key(snapshot_id: &uuid::Uuid) -> Vec<u8> {
    format!("snapshots/{}/meta", snapshot_id).into_bytes()
}

pub(crate) fn snapshot_prefix(snapshot_id: &uuid::Uuid) -> Vec<u8> {
    format!("snapshots/{}/", snapshot_id).into_bytes()
}

pub(crate) fn chunk_prefix(snapshot_id: &uuid::Uuid) -> Vec<u8> {
    format!("snapshots/{}/chunks/", snapshot_id).into_bytes()
}

/// Chunk keys are zero-padded so key order is chunk order
pub(crate) fn chunk_key(snapshot_id: &uuid::Uuid, index: u32) -> Vec<u8> {
    format!("snapshots/{}/chunks/{:010}", snapshot_id, index).into_bytes()
}
