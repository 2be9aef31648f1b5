// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! SQLite source reader
//!
//! Column types come from the declared column type using SQLite's affinity
//! rules. Columns without a declared type (typically view expressions) take
//! the widest storage class found among their values.

use super::{SourceError, SourceReader, SourceResult};
use crate::config::SourceDescriptor;
use crate::dataset::{Column, DataType, Dataset, Schema, Value};
use log::{debug, info};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;

pub struct SqliteReader {
    path: PathBuf,
}

impl SqliteReader {
    pub fn new(descriptor: &SourceDescriptor) -> Self {
        let endpoint = descriptor.endpoint.trim();
        let path = endpoint
            .strip_prefix("sqlite://")
            .unwrap_or(endpoint)
            .to_string();

        if let Some(credentials) = &descriptor.credentials {
            debug!(
                "SQLite sources have no authentication; ignoring credentials for user '{}'",
                credentials.user
            );
        }

        Self {
            path: PathBuf::from(path),
        }
    }

    fn connect(&self) -> SourceResult<Connection> {
        // Read-only and never create: a missing file is an unavailable source
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            SourceError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Affinity of a declared column type; `None` for an empty declaration
fn declared_type(declared: &str) -> Option<DataType> {
    let upper = declared.to_uppercase();
    if upper.trim().is_empty() {
        None
    } else if upper.contains("INT") {
        Some(DataType::Integer)
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        Some(DataType::Text)
    } else if upper.contains("BLOB") {
        Some(DataType::Blob)
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        Some(DataType::Float)
    } else if upper.contains("BOOL") {
        Some(DataType::Boolean)
    } else if upper.contains("DATE") || upper.contains("TIME") {
        // Dates are kept as their stored ISO-8601 text
        Some(DataType::Text)
    } else {
        // NUMERIC affinity (DECIMAL, NUMERIC, ...)
        Some(DataType::Float)
    }
}

fn storage_class(value: &SqlValue) -> Option<DataType> {
    match value {
        SqlValue::Null => None,
        SqlValue::Integer(_) => Some(DataType::Integer),
        SqlValue::Real(_) => Some(DataType::Float),
        SqlValue::Text(_) => Some(DataType::Text),
        SqlValue::Blob(_) => Some(DataType::Blob),
    }
}

/// Type of a column without a declared type: the widest storage class
/// among its non-null values. Integer and real widen to Float, any other
/// mix to Text, an all-NULL column is Text.
fn infer_type<'a>(values: impl Iterator<Item = &'a SqlValue>) -> DataType {
    values
        .filter_map(storage_class)
        .fold(None, |widest, class| {
            Some(match widest {
                None => class,
                Some(current) if current == class => current,
                Some(DataType::Integer | DataType::Float)
                    if matches!(class, DataType::Integer | DataType::Float) =>
                {
                    DataType::Float
                }
                Some(_) => DataType::Text,
            })
        })
        .unwrap_or(DataType::Text)
}

/// Convert a stored value into a cell of `data_type`
fn coerce(value: SqlValue, data_type: DataType) -> Option<Value> {
    match (value, data_type) {
        (SqlValue::Null, _) => Some(Value::Null),
        (SqlValue::Integer(i), DataType::Integer) => Some(Value::Integer(i)),
        (SqlValue::Integer(i), DataType::Float) => Some(Value::Float(i as f64)),
        (SqlValue::Integer(i), DataType::Boolean) => Some(Value::Boolean(i != 0)),
        (SqlValue::Integer(i), DataType::Text) => Some(Value::Text(i.to_string())),
        (SqlValue::Real(f), DataType::Float) => Some(Value::Float(f)),
        (SqlValue::Real(f), DataType::Text) => Some(Value::Text(f.to_string())),
        (SqlValue::Text(s), DataType::Text) => Some(Value::Text(s)),
        (SqlValue::Blob(b), DataType::Text) => String::from_utf8(b).ok().map(Value::Text),
        (SqlValue::Blob(b), DataType::Blob) => Some(Value::Blob(b)),
        _ => None,
    }
}

fn describe(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(i) => format!("integer {}", i),
        SqlValue::Real(f) => format!("real {}", f),
        SqlValue::Text(s) => format!("text '{}'", s),
        SqlValue::Blob(b) => format!("blob of {} bytes", b.len()),
    }
}

impl SourceReader for SqliteReader {
    fn read(&self, relation: &str) -> SourceResult<Dataset> {
        let conn = self.connect()?;
        let unavailable = |e: rusqlite::Error| SourceError::SourceUnavailable(e.to_string());

        let exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
                [relation],
                |row| row.get(0),
            )
            .map_err(unavailable)?;
        if exists == 0 {
            return Err(SourceError::RelationNotFound(relation.to_string()));
        }

        let mut info = conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(relation)))
            .map_err(unavailable)?;
        let declared: Vec<(String, String)> = info
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))
            .map_err(unavailable)?
            .collect::<Result<_, _>>()
            .map_err(unavailable)?;

        let mut select = conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(relation)))
            .map_err(unavailable)?;
        let width = select.column_count();
        if width != declared.len() {
            return Err(SourceError::SchemaInference(format!(
                "relation '{}' reports {} columns but returns {}",
                relation,
                declared.len(),
                width
            )));
        }

        let raw: Vec<Vec<SqlValue>> = select
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<Vec<SqlValue>>>()
            })
            .map_err(unavailable)?
            .collect::<Result<_, _>>()
            .map_err(unavailable)?;

        let columns: Vec<Column> = declared
            .iter()
            .enumerate()
            .map(|(i, (name, declared))| {
                let data_type = declared_type(declared)
                    .unwrap_or_else(|| infer_type(raw.iter().map(|row| &row[i])));
                Column::new(name.clone(), data_type)
            })
            .collect();

        let mut rows = Vec::with_capacity(raw.len());
        for (row_index, raw_row) in raw.into_iter().enumerate() {
            let mut row = Vec::with_capacity(width);
            for (value, column) in raw_row.into_iter().zip(&columns) {
                let description = describe(&value);
                let cell = coerce(value, column.data_type).ok_or_else(|| {
                    SourceError::SchemaInference(format!(
                        "row {}, column '{}': {} does not fit {}",
                        row_index, column.name, description, column.data_type
                    ))
                })?;
                row.push(cell);
            }
            rows.push(row);
        }

        let schema =
            Schema::new(columns).map_err(|e| SourceError::SchemaInference(e.to_string()))?;
        let dataset =
            Dataset::new(schema, rows).map_err(|e| SourceError::SchemaInference(e.to_string()))?;

        info!(
            "Read {} rows from {}:{} {}",
            dataset.row_count(),
            self.path.display(),
            relation,
            dataset.schema()
        );
        Ok(dataset)
    }
}
