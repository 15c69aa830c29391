//! Error types for the pipeline library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all pipeline operations.
///
/// Mutating operations surface [`PipelineError::MissingScript`] and
/// [`PipelineError::ScriptExecution`] to the caller, who is expected to stop
/// the run. Query operations log [`PipelineError::StatementExecution`] and
/// [`PipelineError::ReadOnlyViolation`] per statement and keep going.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Referenced SQL file does not exist or is not a regular file
    #[error("SQL file does not exist: {}", .path.display())]
    MissingScript { path: PathBuf },
    /// A mutating script batch failed and was rolled back
    #[error("Error executing SQL file {}: {source}", .path.display())]
    ScriptExecution {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    /// A single read statement failed
    #[error("Error executing statement '{statement}': {source}")]
    StatementExecution {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },
    /// A statement in a query file is not a read-only query
    #[error("Statement is not a read-only query: '{statement}'")]
    ReadOnlyViolation { statement: String },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{}': {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// CSV decoding errors
    #[error("CSV error in '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> PipelineError {
        PipelineError::Database {
            message: self.message,
            source,
        }
    }
}

impl PipelineError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates an input validation error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the pipeline must stop when this error is returned.
    ///
    /// Per-statement query failures are recoverable; everything else leaves
    /// the database in an unknown state.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::StatementExecution { .. } | Self::ReadOnlyViolation { .. }
        )
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| PipelineError::database(message).with_source(e))
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
