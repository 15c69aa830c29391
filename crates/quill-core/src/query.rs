//! Best-effort execution of read-only query files.
//!
//! A query file is split into statements on `;` and every statement runs on
//! its own. A failing statement is logged and recorded, and the rest of the
//! file still runs, so a caller gets whatever results could be produced.
//!
//! The splitter is purely textual: a `;` inside a string literal, a comment or
//! a trigger body splits the statement in the wrong place. Query files are
//! expected to avoid that.

use std::path::{Path, PathBuf};

use log::{error, info};
use rusqlite::{types::ValueRef, Connection};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

/// Number of characters of a statement shown in log lines and failures.
pub const PREVIEW_CHARS: usize = 50;

/// A single cell of a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(r) => Self::Real(r),
            ValueRef::Text(t) => Self::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Self::Blob(b.to_vec()),
        }
    }
}

impl From<&CellValue> for Value {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Null => Value::Null,
            CellValue::Integer(i) => Value::from(*i),
            CellValue::Real(r) => Value::from(*r),
            CellValue::Text(t) => Value::from(t.as_str()),
            CellValue::Blob(b) => Value::from(b.clone()),
        }
    }
}

/// Named columns and the rows returned for them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as JSON objects keyed by column name.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(Value::from))
                    .collect()
            })
            .collect()
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }
}

/// A statement from a query file and the rows it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementResult {
    pub statement: String,
    pub table: ResultTable,
}

/// A statement that failed, kept so callers can report it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementFailure {
    /// Ordinal of the statement in its file, starting at 1.
    pub position: usize,
    pub statement: String,
    pub message: String,
}

/// Everything produced by running one query file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFileReport {
    pub path: PathBuf,
    pub results: Vec<StatementResult>,
    pub failures: Vec<StatementFailure>,
}

impl QueryFileReport {
    fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// File name for headings, falling back to the full path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// JSON view of the report with rows rendered as column-keyed records.
    pub fn to_json(&self) -> Result<Value> {
        let results = self
            .results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "statement": r.statement,
                    "columns": r.table.columns,
                    "rows": r.table.records(),
                })
            })
            .collect::<Vec<_>>();

        Ok(serde_json::json!({
            "path": self.path.display().to_string(),
            "results": results,
            "failures": serde_json::to_value(&self.failures)?,
        }))
    }
}

/// Splits `sql` on `;`, trimming each fragment and dropping empty ones.
pub fn split_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// The first [`PREVIEW_CHARS`] characters of `statement`.
pub fn preview(statement: &str) -> String {
    match statement.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &statement[..end]),
        None => statement.to_string(),
    }
}

/// Executes one read-only statement and collects all of its rows.
///
/// # Errors
///
/// Returns `PipelineError::ReadOnlyViolation` for statements that could
/// modify the database or return no columns, and
/// `PipelineError::StatementExecution` if SQLite rejects the statement.
pub fn execute_statement(connection: &Connection, sql: &str) -> Result<StatementResult> {
    let failed = |source: rusqlite::Error| PipelineError::StatementExecution {
        statement: preview(sql),
        source,
    };

    let mut stmt = connection.prepare(sql).map_err(failed)?;
    if !stmt.readonly() || stmt.column_count() == 0 {
        return Err(PipelineError::ReadOnlyViolation {
            statement: preview(sql),
        });
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([]).map_err(failed)?;
    let mut table = ResultTable {
        columns,
        rows: Vec::new(),
    };

    while let Some(row) = rows.next().map_err(failed)? {
        let cells = (0..table.columns.len())
            .map(|i| row.get_ref(i).map(CellValue::from))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(failed)?;
        table.rows.push(cells);
    }

    Ok(StatementResult {
        statement: sql.to_string(),
        table,
    })
}

/// Runs query files statement by statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRunner;

impl QueryRunner {
    pub fn new() -> Self {
        Self
    }

    /// Runs every statement in `path` and returns the successful results in
    /// file order. A missing or unreadable file yields no results.
    pub fn run(&self, connection: &Connection, path: &Path) -> Vec<StatementResult> {
        self.run_report(connection, path).results
    }

    /// Like [`QueryRunner::run`], also keeping the failed statements.
    pub fn run_report(&self, connection: &Connection, path: &Path) -> QueryFileReport {
        if !path.is_file() {
            error!("SQL query file does not exist: {}", path.display());
            return QueryFileReport::empty(path);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("Error reading SQL query file {}: {e}", path.display());
                return QueryFileReport::empty(path);
            }
        };

        let mut report = QueryFileReport::empty(path);
        for (index, statement) in split_statements(&content).into_iter().enumerate() {
            match execute_statement(connection, statement) {
                Ok(result) => {
                    info!("Executed statement (first {PREVIEW_CHARS} chars): {}", preview(statement));
                    report.results.push(result);
                }
                Err(e) => {
                    error!("Statement #{} in {} failed: {e}", index + 1, path.display());
                    report.failures.push(StatementFailure {
                        position: index + 1,
                        statement: preview(statement),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
