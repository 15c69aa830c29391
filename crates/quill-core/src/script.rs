//! Transactional execution of mutating SQL scripts.
//!
//! A script file is read in full and executed as one batch inside a single
//! transaction. Either every statement is applied or none is, with one
//! exception: a "duplicate column" error for a column the runner has been told
//! to tolerate. That case means the script already ran in an earlier pipeline
//! run; it is downgraded to a warning.

use std::path::Path;

use log::{error, info, warn};
use rusqlite::{Connection, ErrorCode};
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Outcome of a script run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptOutcome {
    /// Every statement in the file was committed.
    Applied,
    /// The batch was rolled back because a tolerated column already exists.
    ExistingColumnTolerated { column: String },
}

/// Runs mutating SQL script files against a connection.
#[derive(Debug, Clone, Default)]
pub struct ScriptRunner {
    tolerated_columns: Vec<String>,
}

impl ScriptRunner {
    /// Creates a runner that tolerates no schema drift.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats "duplicate column name: `column`" as an already-applied script.
    ///
    /// Only the named column is tolerated; any other duplicate column still
    /// fails the run.
    pub fn tolerate_existing_column(mut self, column: impl Into<String>) -> Self {
        self.tolerated_columns.push(column.into());
        self
    }

    pub fn tolerated_columns(&self) -> &[String] {
        &self.tolerated_columns
    }

    /// Executes the script at `path` as one transaction.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingScript` if `path` is not a regular file,
    /// `PipelineError::FileSystem` if it cannot be read and
    /// `PipelineError::ScriptExecution` if the batch fails for any reason other
    /// than a tolerated existing column. The database is left unchanged on
    /// error.
    pub fn run(&self, connection: &mut Connection, path: &Path) -> Result<ScriptOutcome> {
        if !path.is_file() {
            error!("SQL file does not exist: {}", path.display());
            return Err(PipelineError::MissingScript {
                path: path.to_path_buf(),
            });
        }

        let script = std::fs::read_to_string(path).map_err(|e| PipelineError::FileSystem {
            path: path.to_path_buf(),
            source: e,
        })?;

        match execute_in_transaction(connection, &script) {
            Ok(()) => {
                info!("Executed SQL file: {}", path.display());
                Ok(ScriptOutcome::Applied)
            }
            Err(e) => match self.tolerated_column(&e) {
                Some(column) => {
                    warn!(
                        "Column '{column}' already exists; treating {} as already applied",
                        path.display()
                    );
                    Ok(ScriptOutcome::ExistingColumnTolerated { column })
                }
                None => {
                    error!("Error executing SQL file {}: {e}", path.display());
                    Err(PipelineError::ScriptExecution {
                        path: path.to_path_buf(),
                        source: e,
                    })
                }
            },
        }
    }

    fn tolerated_column(&self, err: &rusqlite::Error) -> Option<String> {
        let column = duplicate_column(err)?;
        self.tolerated_columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&column))
            .then_some(column)
    }
}

/// Runs `script` in a transaction. The transaction rolls back when dropped
/// without a commit.
fn execute_in_transaction(connection: &mut Connection, script: &str) -> rusqlite::Result<()> {
    let tx = connection.transaction()?;
    tx.execute_batch(script)?;
    tx.commit()
}

const DUPLICATE_COLUMN_PREFIX: &str = "duplicate column name: ";

/// Extracts the column name from a SQLite "duplicate column name" error.
///
/// SQLite reports this condition with the generic `SQLITE_ERROR` code, so the
/// code only narrows the candidates and the message text decides. A change in
/// SQLite's wording would make this return `None`.
fn duplicate_column(err: &rusqlite::Error) -> Option<String> {
    if err.sqlite_error_code() != Some(ErrorCode::Unknown) {
        return None;
    }

    let message = err.to_string();
    let start = message.find(DUPLICATE_COLUMN_PREFIX)? + DUPLICATE_COLUMN_PREFIX.len();
    let column = message[start..]
        .split_whitespace()
        .next()?
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '[' | ']'));

    (!column.is_empty()).then(|| column.to_string())
}
