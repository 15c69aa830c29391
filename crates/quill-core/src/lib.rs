//! Core library for the Quill SQL pipeline.
//!
//! Quill populates a local SQLite database from CSV files, applies ordered SQL
//! scripts (drop, create, insert, update, delete, schema additions) and runs
//! analytical query files whose results are handed to the caller.
//!
//! # Components
//!
//! - [`script::ScriptRunner`]: applies a mutating script as one transaction,
//!   tolerating an already-added column when told to.
//! - [`query::QueryRunner`]: splits a query file on `;` and runs each statement
//!   independently, keeping results in file order.
//! - [`loader::load_csv`]: replaces a table with the contents of a CSV file.
//! - [`Pipeline`]: owns the connection and runs the phases of a project.
//!
//! # Quick Start
//!
//! ```rust
//! use std::io::Write;
//!
//! use quill_core::{QueryRunner, ScriptRunner};
//! use rusqlite::Connection;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let script = dir.path().join("create.sql");
//! std::fs::write(&script, "CREATE TABLE books (title TEXT); INSERT INTO books VALUES ('Emma');")?;
//! let queries = dir.path().join("queries.sql");
//! std::fs::write(&queries, "SELECT COUNT(*) FROM books;")?;
//!
//! let mut conn = Connection::open_in_memory()?;
//! ScriptRunner::new().run(&mut conn, &script)?;
//!
//! let results = QueryRunner::new().run(&conn, &queries);
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].statement, "SELECT COUNT(*) FROM books");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod db;
pub mod display;
pub mod error;
pub mod layout;
pub mod loader;
pub mod pipeline;
pub mod query;
pub mod script;

// Re-export commonly used types
pub use db::Database;
pub use display::{LoadSummaries, OperationStatus, Reports};
pub use error::{PipelineError, Result};
pub use layout::{Phase, ProjectLayout};
pub use loader::{load_csv, LoadSummary};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use query::{
    split_statements, CellValue, QueryFileReport, QueryRunner, ResultTable, StatementFailure,
    StatementResult,
};
pub use script::{ScriptOutcome, ScriptRunner};
