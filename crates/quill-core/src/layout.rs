//! Conventional file locations inside a pipeline project directory.

use std::{
    fmt,
    path::{Path, PathBuf},
};

/// A mutating script phase, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Drop,
    Create,
    Insert,
    Update,
    Delete,
    /// Adds the price column to `books` and fills it in.
    Pricing,
}

impl Phase {
    /// Script path relative to the project root.
    pub fn relative_path(self) -> &'static str {
        match self {
            Self::Drop => "sql_create/01_drop_tables.sql",
            Self::Create => "sql_create/02_create_tables.sql",
            Self::Insert => "sql_create/03_insert_tables.sql",
            Self::Update => "sql_features/update_records.sql",
            Self::Delete => "sql_features/delete_records.sql",
            Self::Pricing => "sql_queries/data_addition.sql",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drop => "drop",
            Self::Create => "create",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Pricing => "pricing",
        };
        f.write_str(name)
    }
}

/// Query files run by the analysis phase, in order.
pub const QUERY_FILES: [&str; 5] = [
    "sql_queries/query_aggregation.sql",
    "sql_queries/query_filters.sql",
    "sql_queries/query_sorting.sql",
    "sql_queries/query_group_by.sql",
    "sql_queries/query_join.sql",
];

/// CSV sources and the tables they replace, in load order.
pub const CSV_SOURCES: [(&str, &str); 2] =
    [("authors", "data/authors.csv"), ("books", "data/books.csv")];

/// Resolves conventional paths against a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn script(&self, phase: Phase) -> PathBuf {
        self.root.join(phase.relative_path())
    }

    pub fn query_files(&self) -> Vec<PathBuf> {
        QUERY_FILES.iter().map(|f| self.root.join(f)).collect()
    }

    /// `(table, csv path)` pairs in load order.
    pub fn csv_sources(&self) -> Vec<(&'static str, PathBuf)> {
        CSV_SOURCES
            .iter()
            .map(|(table, file)| (*table, self.root.join(file)))
            .collect()
    }
}
