//! SQLite connection management.
//!
//! A [`Database`] owns the single connection used for a pipeline run. Every
//! component borrows it through [`Database::connection`] or
//! [`Database::connection_mut`]; nothing holds a process-wide handle.

use std::path::{Path, PathBuf};

use log::{info, warn};
use rusqlite::Connection;

use crate::error::{DatabaseResultExt, PipelineError, Result};

/// Database connection owned by one pipeline run.
pub struct Database {
    connection: Connection,
    path: PathBuf,
}

impl Database {
    /// Opens (or creates) the database file at `path`.
    ///
    /// Missing parent directories are created first. When `foreign_keys` is
    /// set, `PRAGMA foreign_keys = ON` is issued for this connection.
    pub fn open<P: AsRef<Path>>(path: P, foreign_keys: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let connection = Connection::open(&path).db_context("Failed to open database connection")?;
        if foreign_keys {
            connection
                .execute_batch("PRAGMA foreign_keys = ON;")
                .db_context("Failed to enable foreign keys")?;
        }

        info!("Connected to database: {}", path.display());
        Ok(Self { connection, path })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().db_context("Failed to open in-memory database")?;
        Ok(Self {
            connection,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Closes the connection. A failure to close is logged, not returned.
    pub fn close(self) {
        let Self { connection, path } = self;
        match connection.close() {
            Ok(()) => info!("Database connection closed: {}", path.display()),
            Err((_, e)) => warn!("Failed to close database {}: {e}", path.display()),
        }
    }
}
