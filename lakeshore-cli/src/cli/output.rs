// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Output formatting for datasets, histories and refs

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use lakeshore::catalog::RefInfo;
use lakeshore::{Dataset, SnapshotEntry, TableIdentity, Value};
use serde_json::{json, Value as JsonValue};

use super::commands::OutputFormat;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Formats the first `limit` rows of a dataset
pub fn format_dataset(dataset: &Dataset, limit: usize, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_dataset_table(dataset, limit),
        OutputFormat::Json => format_dataset_json(dataset, limit),
    }
}

fn format_dataset_table(dataset: &Dataset, limit: usize) -> String {
    let mut table = new_table();
    table.set_header(
        dataset
            .schema()
            .columns()
            .iter()
            .map(|c| Cell::new(format!("{}\n{}", c.name, c.data_type))),
    );
    for row in dataset.head(limit) {
        table.add_row(row.iter().map(|v| Cell::new(v.to_string())));
    }

    let mut out = table.to_string();
    if dataset.row_count() > limit {
        out.push_str(&format!(
            "\n({} of {} rows shown)",
            limit,
            dataset.row_count()
        ));
    } else {
        out.push_str(&format!("\n({} rows)", dataset.row_count()));
    }
    out
}

fn format_dataset_json(dataset: &Dataset, limit: usize) -> String {
    let names = dataset.schema().column_names();
    let rows: Vec<JsonValue> = dataset
        .head(limit)
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for (name, value) in names.iter().zip(row) {
                obj.insert(name.to_string(), value_to_json(value));
            }
            JsonValue::Object(obj)
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => json!(*i),
        Value::Float(f) => json!(*f),
        Value::Text(s) => json!(s),
        Value::Boolean(b) => json!(*b),
        Value::Blob(b) => json!(b),
    }
}

pub fn format_history(entries: &[SnapshotEntry]) -> String {
    let mut table = new_table();
    table.set_header(vec!["version", "snapshot", "rows", "committed at"]);
    for entry in entries {
        table.add_row(vec![
            entry.version.to_string(),
            entry.snapshot_id.to_string(),
            entry.row_count.to_string(),
            entry.committed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_refs(refs: &[RefInfo]) -> String {
    let mut table = new_table();
    table.set_header(vec!["ref", "forked from", "created at"]);
    for info in refs {
        table.add_row(vec![
            info.name.clone(),
            info.forked_from.clone().unwrap_or_else(|| "-".to_string()),
            info.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_tables(tables: &[TableIdentity]) -> String {
    let mut table = new_table();
    table.set_header(vec!["table"]);
    for identity in tables {
        table.add_row(vec![identity.to_string()]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakeshore::DataType;

    fn sample() -> Dataset {
        Dataset::from_columns(
            &[("id", DataType::Integer), ("name", DataType::Text)],
            vec![
                vec![Value::Integer(1), Value::from("a")],
                vec![Value::Integer(2), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_table_shows_header_and_truncation() {
        let out = format_dataset(&sample(), 1, OutputFormat::Table);
        assert!(out.contains("id"));
        assert!(out.contains("INTEGER"));
        assert!(out.contains("(1 of 2 rows shown)"));
        assert!(!out.contains("NULL"));
    }

    #[test]
    fn test_json_rows_are_objects() {
        let out = format_dataset(&sample(), 10, OutputFormat::Json);
        let parsed: JsonValue = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["id"], json!(1));
        assert_eq!(parsed[0]["name"], json!("a"));
        assert_eq!(parsed[1]["name"], JsonValue::Null);
    }
}
