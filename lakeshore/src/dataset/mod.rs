// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory tabular values
//!
//! A [`Dataset`] is an ordered list of named, typed columns plus zero or more
//! rows. It is produced once by a source reader and then only read: the
//! table writer stages its rows, the verifier compares against it.

mod value;

pub use value::{DataType, Value};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while assembling a dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// A dataset must carry at least one column
    #[error("Dataset schema has no columns")]
    EmptySchema,

    /// Two columns share the same name
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A row does not have one cell per column
    #[error("Row {row} has {actual} cells, expected {expected}")]
    RowArity {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A cell does not fit its column's declared type
    #[error("Row {row}, column '{column}': {value} is not a {expected}")]
    CellType {
        row: usize,
        column: String,
        expected: DataType,
        value: String,
    },
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column list of a dataset or a table snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema, rejecting empty column lists and duplicate names
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        if columns.is_empty() {
            return Err(DatasetError::EmptySchema);
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.data_type))
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// One row: exactly one value per schema column, in schema order
pub type Row = Vec<Value>;

/// Immutable tabular value
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset, checking every row against the schema
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self, DatasetError> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(DatasetError::RowArity {
                    row: index,
                    expected: schema.len(),
                    actual: row.len(),
                });
            }
            for (value, column) in row.iter().zip(schema.columns()) {
                if !value.fits(column.data_type) {
                    return Err(DatasetError::CellType {
                        row: index,
                        column: column.name.clone(),
                        expected: column.data_type,
                        value: value.to_string(),
                    });
                }
            }
        }

        Ok(Self { schema, rows })
    }

    /// Convenience constructor from `(name, type)` pairs
    pub fn from_columns(
        columns: &[(&str, DataType)],
        rows: Vec<Row>,
    ) -> Result<Self, DatasetError> {
        let schema = Schema::new(
            columns
                .iter()
                .map(|(name, data_type)| Column::new(*name, *data_type))
                .collect(),
        )?;
        Self::new(schema, rows)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First `limit` rows, for printing samples
    pub fn head(&self, limit: usize) -> &[Row] {
        &self.rows[..limit.min(self.rows.len())]
    }

    /// Dataset holding only the first `limit` rows
    pub fn sample(&self, limit: usize) -> Dataset {
        Dataset {
            schema: self.schema.clone(),
            rows: self.head(limit).to_vec(),
        }
    }

    /// Rows sorted into a canonical order, for multiset comparison
    pub fn sorted_rows(&self) -> Vec<Row> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            a.iter()
                .zip(b.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|ord| ord.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_schema_rejected() {
        assert_eq!(Schema::new(vec![]), Err(DatasetError::EmptySchema));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Schema::new(vec![
            Column::new("id", DataType::Integer),
            Column::new("id", DataType::Text),
        ]);
        assert_eq!(result, Err(DatasetError::DuplicateColumn("id".to_string())));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let result = Dataset::from_columns(
            &[("id", DataType::Integer), ("name", DataType::Text)],
            vec![vec![Value::Integer(1)]],
        );
        assert!(matches!(result, Err(DatasetError::RowArity { row: 0, .. })));
    }

    #[test]
    fn test_cell_type_checked_but_null_allowed() {
        let bad = Dataset::from_columns(
            &[("id", DataType::Integer)],
            vec![vec![Value::Text("x".to_string())]],
        );
        assert!(matches!(bad, Err(DatasetError::CellType { .. })));

        let ok = Dataset::from_columns(&[("id", DataType::Integer)], vec![vec![Value::Null]]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_sorted_rows_is_order_insensitive() {
        let a = Dataset::from_columns(
            &[("id", DataType::Integer)],
            vec![vec![Value::Integer(2)], vec![Value::Integer(1)]],
        )
        .unwrap();
        let b = Dataset::from_columns(
            &[("id", DataType::Integer)],
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
        )
        .unwrap();
        assert_eq!(a.sorted_rows(), b.sorted_rows());
        assert_eq!(a.head(1), &[vec![Value::Integer(2)]]);
        assert_eq!(a.head(10).len(), 2);
    }
}
