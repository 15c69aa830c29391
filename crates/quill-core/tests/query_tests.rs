mod common;

use common::{count_rows, write_sql};
use quill_core::{CellValue, QueryRunner};
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

/// Five books by two authors.
fn library_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open database");
    conn.execute_batch(
        "CREATE TABLE authors (author_id INTEGER PRIMARY KEY, last_name TEXT);
         CREATE TABLE books (book_id INTEGER PRIMARY KEY, title TEXT, author_id INTEGER);
         INSERT INTO authors VALUES (1, 'Austen'), (2, 'Twain');
         INSERT INTO books VALUES
             (1, 'Emma', 1), (2, 'Persuasion', 1), (3, 'Sense and Sensibility', 1),
             (4, 'Roughing It', 2), (5, 'The Prince and the Pauper', 2);",
    )
    .expect("Failed to seed database");
    conn
}

#[test]
fn test_counts_are_returned_in_file_order() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_sql(
        &dir,
        "query_aggregation.sql",
        "SELECT COUNT(*) FROM books; SELECT COUNT(*) FROM authors;",
    );
    let conn = library_connection();

    let results = QueryRunner::new().run(&conn, &path);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].statement, "SELECT COUNT(*) FROM books");
    assert_eq!(results[1].statement, "SELECT COUNT(*) FROM authors");
    assert_eq!(
        serde_json::to_value(results[0].table.records()).expect("Failed to serialize"),
        json!([{"COUNT(*)": 5}])
    );
    assert_eq!(
        serde_json::to_value(results[1].table.records()).expect("Failed to serialize"),
        json!([{"COUNT(*)": 2}])
    );
}

#[test]
fn test_all_statements_succeed() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_sql(
        &dir,
        "query_sorting.sql",
        "SELECT title FROM books ORDER BY title;\n\n\
         SELECT last_name FROM authors ORDER BY last_name DESC;\n\
         SELECT author_id, COUNT(*) AS n FROM books GROUP BY author_id;\n",
    );
    let conn = library_connection();

    let report = QueryRunner::new().run_report(&conn, &path);

    assert_eq!(report.results.len(), 3);
    assert!(report.failures.is_empty());
    assert_eq!(report.results[0].table.rows.len(), 5);
    assert_eq!(
        report.results[1].table.value(0, "last_name"),
        Some(&CellValue::Text("Twain".to_string()))
    );
    assert_eq!(
        report.results[2].table.value(1, "n"),
        Some(&CellValue::Integer(2))
    );
}

#[test]
fn test_failing_statement_is_skipped() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_sql(
        &dir,
        "query_filters.sql",
        "SELECT title FROM books WHERE author_id = 1;
         SELECT * FROM publishers;
         SELECT last_name FROM authors WHERE author_id = 2;",
    );
    let conn = library_connection();

    let report = QueryRunner::new().run_report(&conn, &path);

    assert_eq!(report.results.len(), 2);
    assert_eq!(
        report.results[0].statement,
        "SELECT title FROM books WHERE author_id = 1"
    );
    assert_eq!(
        report.results[1].statement,
        "SELECT last_name FROM authors WHERE author_id = 2"
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].position, 2);
    assert!(report.failures[0].message.contains("publishers"));
}

#[test]
fn test_first_and_last_statement_failures() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_sql(
        &dir,
        "query_join.sql",
        "SELEC 1; SELECT 'kept' AS v; SELECT missing_column FROM books",
    );
    let conn = library_connection();

    let results = QueryRunner::new().run(&conn, &path);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].statement, "SELECT 'kept' AS v");
}

#[test]
fn test_missing_file_returns_no_results() {
    let conn = library_connection();
    let path = std::path::Path::new("/nonexistent/query_group_by.sql");

    let results = QueryRunner::new().run(&conn, path);
    assert!(results.is_empty());

    let report = QueryRunner::new().run_report(&conn, path);
    assert!(report.is_empty());
    assert!(report.failures.is_empty());
}

#[test]
fn test_mutating_statements_are_not_executed() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_sql(
        &dir,
        "query_mixed.sql",
        "DELETE FROM books; SELECT COUNT(*) AS n FROM books; DROP TABLE authors;",
    );
    let conn = library_connection();

    let report = QueryRunner::new().run_report(&conn, &path);

    assert_eq!(report.results.len(), 1);
    assert_eq!(
        report.results[0].table.value(0, "n"),
        Some(&CellValue::Integer(5))
    );
    assert_eq!(
        report
            .failures
            .iter()
            .map(|f| f.position)
            .collect::<Vec<_>>(),
        vec![1, 3]
    );
    assert_eq!(count_rows(&conn, "books"), 5);
    assert_eq!(count_rows(&conn, "authors"), 2);
}

#[test]
fn test_empty_file_returns_no_results() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_sql(&dir, "empty.sql", "\n ; \n;\n");
    let conn = library_connection();

    assert!(QueryRunner::new().run(&conn, &path).is_empty());
}

#[test]
fn test_report_json_uses_column_records() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_sql(
        &dir,
        "query.sql",
        "SELECT title FROM books WHERE book_id = 4; SELECT nope FROM books;",
    );
    let conn = library_connection();

    let json = QueryRunner::new()
        .run_report(&conn, &path)
        .to_json()
        .expect("Failed to build JSON");

    assert_eq!(json["results"][0]["rows"], json!([{"title": "Roughing It"}]));
    assert_eq!(json["failures"][0]["position"], json!(2));
}
