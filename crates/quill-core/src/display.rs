//! Markdown formatting for query results and pipeline outcomes.
//!
//! Domain types implement [`std::fmt::Display`] directly; the newtype
//! wrappers [`Reports`] and [`LoadSummaries`] format collections with empty
//! handling, and [`OperationStatus`] formats one-line confirmations. The CLI
//! renders the resulting markdown to the terminal.
//!
//! # Examples
//!
//! ```rust
//! use quill_core::query::{CellValue, ResultTable};
//!
//! let table = ResultTable {
//!     columns: vec!["COUNT(*)".to_string()],
//!     rows: vec![vec![CellValue::Integer(5)]],
//! };
//! let output = table.to_string();
//! assert!(output.contains("| COUNT(*) |"));
//! assert!(output.contains("| 5 |"));
//! ```

use std::fmt;

use crate::{
    loader::LoadSummary,
    query::{CellValue, QueryFileReport, ResultTable, StatementResult},
    script::ScriptOutcome,
};

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(t) => f.write_str(t),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Escapes a cell so it stays inside its markdown table column.
fn table_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return writeln!(f, "_No columns._");
        }

        let header = self
            .columns
            .iter()
            .map(|c| table_cell(c))
            .collect::<Vec<_>>()
            .join(" | ");
        writeln!(f, "| {header} |")?;
        writeln!(f, "|{}", "---|".repeat(self.columns.len()))?;

        for row in &self.rows {
            let cells = row
                .iter()
                .map(|c| table_cell(&c.to_string()))
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(f, "| {cells} |")?;
        }

        if self.rows.is_empty() {
            writeln!(f)?;
            writeln!(f, "_No rows._")?;
        }
        Ok(())
    }
}

impl fmt::Display for StatementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "**Statement:** `{}`", self.statement.replace('\n', " "))?;
        writeln!(f)?;
        write!(f, "{}", self.table)
    }
}

impl fmt::Display for QueryFileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Results for {}", self.name())?;
        writeln!(f)?;

        if self.results.is_empty() && self.failures.is_empty() {
            writeln!(f, "No results returned.")?;
        }

        for result in &self.results {
            write!(f, "{result}")?;
            writeln!(f)?;
        }

        if !self.failures.is_empty() {
            writeln!(f, "### Failed statements")?;
            writeln!(f)?;
            for failure in &self.failures {
                writeln!(
                    f,
                    "- #{} `{}`: {}",
                    failure.position,
                    failure.statement.replace('\n', " "),
                    failure.message
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Loaded {} rows into `{}` from {}",
            self.rows,
            self.table,
            self.source.display()
        )
    }
}

/// Newtype wrapper for displaying the reports of several query files.
pub struct Reports(pub Vec<QueryFileReport>);

impl Reports {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryFileReport> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Reports {
    type Item = &'a QueryFileReport;
    type IntoIter = std::slice::Iter<'a, QueryFileReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Reports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No query files run.")
        } else {
            for report in &self.0 {
                write!(f, "{report}")?;
            }
            Ok(())
        }
    }
}

/// Newtype wrapper for displaying CSV load results.
pub struct LoadSummaries(pub Vec<LoadSummary>);

impl fmt::Display for LoadSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No tables loaded.")
        } else {
            for summary in &self.0 {
                write!(f, "{summary}")?;
            }
            Ok(())
        }
    }
}

/// Wrapper type for displaying operation confirmation messages.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    /// Create a new success status.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create a new warning status.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }

    /// Status line for a script run.
    pub fn for_script(script: &str, outcome: &ScriptOutcome) -> Self {
        match outcome {
            ScriptOutcome::Applied => Self::success(format!("Executed {script}")),
            ScriptOutcome::ExistingColumnTolerated { column } => Self::warning(format!(
                "{script} already applied (column `{column}` exists)"
            )),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}",
            if self.success { "Success:" } else { "Warning:" },
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::query::StatementFailure;

    fn counts_table() -> ResultTable {
        ResultTable {
            columns: vec!["genre".to_string(), "total".to_string()],
            rows: vec![
                vec![CellValue::Text("Fiction".to_string()), CellValue::Integer(3)],
                vec![CellValue::Text("a|b".to_string()), CellValue::Null],
            ],
        }
    }

    #[test]
    fn test_result_table_markdown() {
        let output = counts_table().to_string();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "| genre | total |");
        assert_eq!(lines[1], "|---|---|");
        assert_eq!(lines[2], "| Fiction | 3 |");
        assert_eq!(lines[3], "| a\\|b | NULL |");
    }

    #[test]
    fn test_empty_result_table() {
        let table = ResultTable {
            columns: vec!["title".to_string()],
            rows: Vec::new(),
        };
        assert!(table.to_string().contains("_No rows._"));
    }

    #[test]
    fn test_report_lists_failures() {
        let report = QueryFileReport {
            path: PathBuf::from("sql_queries/query_filters.sql"),
            results: vec![StatementResult {
                statement: "SELECT genre, COUNT(*) AS total FROM books".to_string(),
                table: counts_table(),
            }],
            failures: vec![StatementFailure {
                position: 2,
                statement: "SELECT * FROM nowhere".to_string(),
                message: "no such table: nowhere".to_string(),
            }],
        };

        let output = report.to_string();
        assert!(output.starts_with("## Results for query_filters.sql"));
        assert!(output.contains("**Statement:** `SELECT genre, COUNT(*) AS total FROM books`"));
        assert!(output.contains("### Failed statements"));
        assert!(output.contains("- #2 `SELECT * FROM nowhere`: no such table: nowhere"));
    }

    #[test]
    fn test_empty_collections() {
        assert_eq!(Reports(Vec::new()).to_string(), "No query files run.\n");
        assert_eq!(LoadSummaries(Vec::new()).to_string(), "No tables loaded.\n");
    }

    #[test]
    fn test_operation_status_for_script() {
        let applied = OperationStatus::for_script("update_records.sql", &ScriptOutcome::Applied);
        assert_eq!(applied.to_string(), "Success: Executed update_records.sql\n");

        let tolerated = OperationStatus::for_script(
            "data_addition.sql",
            &ScriptOutcome::ExistingColumnTolerated {
                column: "book_price".to_string(),
            },
        );
        assert!(tolerated.to_string().starts_with("Warning:"));
        assert!(tolerated.to_string().contains("book_price"));
    }
}
