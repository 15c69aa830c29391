#![allow(dead_code)]

use std::path::{Path, PathBuf};

use quill_core::{Pipeline, PipelineBuilder};
use rusqlite::Connection;
use tempfile::TempDir;

/// Path of the demo project shipped with the repository.
pub fn demo_project() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demo")
}

/// Helper function to create a pipeline over the demo project with a
/// temporary database
pub fn create_test_pipeline() -> (TempDir, Pipeline) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("db.sqlite");
    let pipeline = PipelineBuilder::new()
        .with_project_dir(demo_project())
        .with_database_path(Some(&db_path))
        .build()
        .expect("Failed to create pipeline");
    (temp_dir, pipeline)
}

/// Writes `content` to `name` inside `dir` and returns the path.
pub fn write_sql(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write SQL file");
    path
}

/// Counts the rows of `table`.
pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .expect("Failed to count rows")
}

/// Counts the columns of `table` named `column`.
pub fn column_count(conn: &Connection, table: &str, column: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get(0),
    )
    .expect("Failed to inspect table")
}
