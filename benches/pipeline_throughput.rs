// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// End-to-end ingestion throughput: SQLite source into each catalog backend

use lakeshore::{
    run_pipeline, CatalogDescriptor, PipelineConfig, SourceDescriptor, TableIdentity,
};
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const ROWS: [usize; 3] = [1_000, 10_000, 100_000];
const RUNS: u32 = 5;

fn seed(path: &Path, rows: usize) {
    let mut conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE events (id INTEGER PRIMARY KEY, kind TEXT, amount REAL, at DATE)",
    )
    .unwrap();
    let tx = conn.transaction().unwrap();
    {
        let mut insert = tx
            .prepare("INSERT INTO events VALUES (?1, ?2, ?3, ?4)")
            .unwrap();
        for i in 0..rows {
            insert
                .execute(params![
                    i as i64,
                    format!("kind-{}", i % 7),
                    i as f64 * 0.25,
                    "2024-01-01"
                ])
                .unwrap();
        }
    }
    tx.commit().unwrap();
}

fn config(db: &Path, catalog_uri: String, batch_rows: usize) -> PipelineConfig {
    let mut config = PipelineConfig::new(
        SourceDescriptor {
            endpoint: db.display().to_string(),
            credentials: None,
            driver: "sqlite".to_string(),
            relation: "events".to_string(),
        },
        CatalogDescriptor::new(catalog_uri),
        TableIdentity::parse("bench.events").unwrap(),
    );
    config.write.batch_rows = batch_rows;
    config
}

fn measure(label: &str, db: &Path, catalog_uri: impl Fn(u32) -> String, rows: usize) {
    let mut total = Duration::ZERO;
    for run in 0..RUNS {
        let start = Instant::now();
        let report = run_pipeline(config(db, catalog_uri(run), 1024)).unwrap();
        let elapsed = start.elapsed();
        assert_eq!(report.rows_read, rows);
        total += elapsed;
    }
    let average = total / RUNS;
    println!(
        "  {:<8} {:>8.2} ms  ({:.0} rows/s)",
        label,
        average.as_secs_f64() * 1000.0,
        rows as f64 / average.as_secs_f64()
    );
}

fn main() {
    println!("=== Pipeline Throughput Benchmark ===\n");

    for rows in ROWS {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("source.sqlite");
        seed(&db, rows);
        println!("{} rows (average of {} runs):", rows, RUNS);

        measure("memory", &db, |_| "memory://".to_string(), rows);

        // redb replaces the same table on every run after the first.
        // sled gets a fresh directory per run: its flusher thread can hold
        // the directory lock for a moment after the previous handle drops.
        let redb = temp_dir.path().join("catalog.redb");
        measure("redb", &db, |_| format!("redb://{}", redb.display()), rows);
        let sled = temp_dir.path().to_path_buf();
        measure(
            "sled",
            &db,
            |run| format!("sled://{}", sled.join(format!("catalog-{}.sled", run)).display()),
            rows,
        );
        println!();
    }

    println!("=== Batch Size (10000 rows, redb) ===\n");
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("source.sqlite");
    seed(&db, 10_000);
    for batch_rows in [64, 1024, 10_000] {
        let catalog = temp_dir.path().join(format!("batch-{}.redb", batch_rows));
        let start = Instant::now();
        run_pipeline(config(&db, format!("redb://{}", catalog.display()), batch_rows)).unwrap();
        let elapsed = start.elapsed();
        println!(
            "  batch_rows {:>6}: {:.2} ms",
            batch_rows,
            elapsed.as_secs_f64() * 1000.0
        );
    }
}
