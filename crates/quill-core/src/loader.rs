//! Bulk loading of CSV files into SQLite tables.
//!
//! Loading replaces the target table wholesale: it is dropped, recreated with
//! one column per CSV header and filled with every record, all in one
//! transaction.

use std::path::{Path, PathBuf};

use log::info;
use rusqlite::{params_from_iter, types::Value, Connection};
use serde::Serialize;

use crate::error::{DatabaseResultExt, PipelineError, Result};

/// Result of loading one CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub table: String,
    pub source: PathBuf,
    pub rows: usize,
}

/// SQLite column affinity inferred from a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affinity {
    Integer,
    Real,
    Text,
}

impl Affinity {
    fn sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    /// Narrowest affinity that can hold every non-empty cell.
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        cells
            .filter(|c| !c.is_empty())
            .fold(Self::Integer, |acc, cell| match acc {
                Self::Integer if cell.parse::<i64>().is_ok() => Self::Integer,
                Self::Integer | Self::Real if cell.parse::<f64>().is_ok() => Self::Real,
                _ => Self::Text,
            })
    }

    fn value(self, cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        match self {
            Self::Integer => cell.parse().map_or_else(|_| text(cell), Value::Integer),
            Self::Real => cell.parse().map_or_else(|_| text(cell), Value::Real),
            Self::Text => text(cell),
        }
    }
}

fn text(cell: &str) -> Value {
    Value::Text(cell.to_string())
}

/// Quotes an identifier for use in generated SQL.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Replaces `table` with the contents of the CSV file at `path`.
///
/// # Errors
///
/// Returns `PipelineError::FileSystem` if the file cannot be opened,
/// `PipelineError::Csv` if it is malformed, `PipelineError::InvalidInput` for
/// an empty table name or header, and `PipelineError::Database` if the table
/// cannot be replaced. The table is untouched on error.
pub fn load_csv(connection: &mut Connection, table: &str, path: &Path) -> Result<LoadSummary> {
    if table.trim().is_empty() {
        return Err(PipelineError::invalid_input("table", "Table name cannot be empty"));
    }

    let csv_error = |source: csv::Error| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|e| PipelineError::FileSystem {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(String::from)
        .collect();
    if headers.is_empty() || headers.iter().any(String::is_empty) {
        return Err(PipelineError::invalid_input(
            "header",
            format!("{} has an empty column name", path.display()),
        ));
    }

    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(csv_error)?;

    let affinities: Vec<Affinity> = (0..headers.len())
        .map(|i| Affinity::infer(records.iter().map(|r| r.get(i).unwrap_or_default())))
        .collect();

    let quoted = quote_identifier(table);
    let columns = headers
        .iter()
        .zip(&affinities)
        .map(|(name, affinity)| format!("{} {}", quote_identifier(name), affinity.sql()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; headers.len()].join(", ");

    let tx = connection
        .transaction()
        .db_context("Failed to begin load transaction")?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {quoted}; CREATE TABLE {quoted} ({columns});"
    ))
    .db_context(&format!("Failed to recreate table {table}"))?;

    {
        let mut insert = tx
            .prepare(&format!("INSERT INTO {quoted} VALUES ({placeholders})"))
            .db_context(&format!("Failed to prepare insert into {table}"))?;
        for record in &records {
            let values = affinities
                .iter()
                .enumerate()
                .map(|(i, affinity)| affinity.value(record.get(i).unwrap_or_default()));
            insert
                .execute(params_from_iter(values))
                .db_context(&format!("Failed to insert row into {table}"))?;
        }
    }

    tx.commit()
        .db_context(&format!("Failed to commit load of {table}"))?;

    info!(
        "Loaded {} rows into {table} from {}",
        records.len(),
        path.display()
    );

    Ok(LoadSummary {
        table: table.to_string(),
        source: path.to_path_buf(),
        rows: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create CSV file");
        file.write_all(content.as_bytes())
            .expect("Failed to write CSV file");
        file
    }

    #[test]
    fn test_infer_affinity() {
        assert_eq!(Affinity::infer(["1", "", "42"].into_iter()), Affinity::Integer);
        assert_eq!(Affinity::infer(["1", "2.5"].into_iter()), Affinity::Real);
        assert_eq!(Affinity::infer(["1", "two"].into_iter()), Affinity::Text);
        assert_eq!(Affinity::infer(["2.5", "two", "3"].into_iter()), Affinity::Text);
        assert_eq!(Affinity::infer(std::iter::empty()), Affinity::Integer);
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("books"), "\"books\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_load_replaces_table() {
        let mut conn = Connection::open_in_memory().expect("Failed to open database");
        conn.execute_batch("CREATE TABLE authors (legacy TEXT); INSERT INTO authors VALUES ('old');")
            .expect("Failed to seed table");

        let file = csv_file("author_id,first_name,rating\n1,Mark,4.5\n2,Jane,\n");
        let summary = load_csv(&mut conn, "authors", file.path()).expect("Load should succeed");
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.table, "authors");

        let (name, rating): (String, Option<f64>) = conn
            .query_row(
                "SELECT first_name, rating FROM authors WHERE author_id = 2",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("Failed to read row");
        assert_eq!(name, "Jane");
        assert_eq!(rating, None);

        let id_type: String = conn
            .query_row("SELECT typeof(author_id) FROM authors LIMIT 1", [], |row| row.get(0))
            .expect("Failed to read type");
        assert_eq!(id_type, "integer");

        let legacy = conn.prepare("SELECT legacy FROM authors");
        assert!(legacy.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let mut conn = Connection::open_in_memory().expect("Failed to open database");
        let err = load_csv(&mut conn, "books", Path::new("/nonexistent/books.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::FileSystem { .. }));
    }

    #[test]
    fn test_load_rejects_ragged_rows() {
        let mut conn = Connection::open_in_memory().expect("Failed to open database");
        let file = csv_file("a,b\n1,2\n3\n");
        let err = load_csv(&mut conn, "t", file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Csv { .. }));
    }
}
