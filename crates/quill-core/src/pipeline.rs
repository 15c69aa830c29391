//! Pipeline orchestration over a single database connection.
//!
//! A [`Pipeline`] owns the one [`Database`] used for a run and lends its
//! connection to the script runner, the query runner and the CSV loader in
//! turn. Phases are plain method calls; nothing runs concurrently.
//!
//! ```text
//! load_sources ──▶ create_schema ──▶ apply_features ──▶ analyze
//!   (CSV)          (drop, create)    (insert, update,    (pricing,
//!                                     delete)             query files)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use quill_core::PipelineBuilder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pipeline = PipelineBuilder::new()
//!     .with_project_dir("./library")
//!     .with_database_path(Some("./library/data/db.sqlite"))
//!     .build()?;
//!
//! pipeline.create_schema()?;
//! pipeline.apply_features()?;
//! for report in pipeline.analyze()? {
//!     println!("{report}");
//! }
//! pipeline.close();
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    db::Database,
    error::{PipelineError, Result},
    layout::{Phase, ProjectLayout},
    loader::{load_csv, LoadSummary},
    query::{execute_statement, QueryFileReport, QueryRunner, StatementFailure, StatementResult},
    script::{ScriptOutcome, ScriptRunner},
};

/// Columns whose re-addition is treated as an already-applied script.
pub const DEFAULT_TOLERATED_COLUMNS: [&str; 1] = ["book_price"];

/// Builder for creating and configuring [`Pipeline`] instances.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    database_path: Option<PathBuf>,
    project_dir: PathBuf,
    foreign_keys: bool,
    tolerated_columns: Vec<String>,
}

impl PipelineBuilder {
    /// Creates a builder rooted at the current directory.
    pub fn new() -> Self {
        Self {
            database_path: None,
            project_dir: PathBuf::from("."),
            foreign_keys: false,
            tolerated_columns: DEFAULT_TOLERATED_COLUMNS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/quill/db.sqlite` or `~/.local/share/quill/db.sqlite`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the directory holding `data/`, `sql_create/`, `sql_features/`
    /// and `sql_queries/`.
    pub fn with_project_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Enables `PRAGMA foreign_keys` on the connection.
    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Adds a column whose "already exists" error is tolerated.
    pub fn tolerate_existing_column(mut self, column: impl Into<String>) -> Self {
        self.tolerated_columns.push(column.into());
        self
    }

    /// Replaces the tolerated column list.
    pub fn with_tolerated_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tolerated_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Opens the database and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::XdgDirectory` if no default database path can
    /// be determined, `PipelineError::FileSystem` if its directory cannot be
    /// created and `PipelineError::Database` if the connection fails.
    pub fn build(self) -> Result<Pipeline> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        let db = Database::open(&db_path, self.foreign_keys)?;
        let scripts = self
            .tolerated_columns
            .into_iter()
            .fold(ScriptRunner::new(), ScriptRunner::tolerate_existing_column);

        Ok(Pipeline {
            db,
            layout: ProjectLayout::new(self.project_dir),
            scripts,
            queries: QueryRunner::new(),
        })
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("quill")
            .place_data_file("db.sqlite")
            .map_err(|e| PipelineError::XdgDirectory(e.to_string()))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One pipeline run over one database connection.
pub struct Pipeline {
    db: Database,
    layout: ProjectLayout,
    scripts: ScriptRunner,
    queries: QueryRunner,
}

impl Pipeline {
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn script_runner(&self) -> &ScriptRunner {
        &self.scripts
    }

    /// Replaces `authors` and `books` with the project's CSV files.
    pub fn load_sources(&mut self) -> Result<Vec<LoadSummary>> {
        self.layout
            .csv_sources()
            .into_iter()
            .map(|(table, path)| load_csv(self.db.connection_mut(), table, &path))
            .collect()
    }

    /// Drops and recreates the schema.
    pub fn create_schema(&mut self) -> Result<()> {
        self.run_phases(&[Phase::Drop, Phase::Create])
    }

    /// Inserts the seed rows, then applies the update and delete scripts.
    pub fn apply_features(&mut self) -> Result<()> {
        self.run_phases(&[Phase::Insert, Phase::Update, Phase::Delete])?;
        info!("Feature engineering operations completed successfully.");
        Ok(())
    }

    /// Applies the pricing script, then runs every query file.
    ///
    /// A missing query file produces an empty report; a failing pricing
    /// script stops the analysis.
    pub fn analyze(&mut self) -> Result<Vec<QueryFileReport>> {
        self.run_phases(&[Phase::Pricing])?;

        let reports = self
            .layout
            .query_files()
            .iter()
            .map(|path| {
                info!("Executing query file: {}", path.display());
                let report = self.run_queries(path);
                if report.is_empty() {
                    warn!("No results returned for {}", report.name());
                }
                report
            })
            .collect();
        Ok(reports)
    }

    /// Runs every phase in order: load, create, features, analyze.
    pub fn run_all(&mut self) -> Result<Vec<QueryFileReport>> {
        self.load_sources()?;
        self.create_schema()?;
        self.apply_features()?;
        self.analyze()
    }

    /// Runs one mutating script.
    pub fn run_script(&mut self, path: &Path) -> Result<ScriptOutcome> {
        self.scripts.run(self.db.connection_mut(), path)
    }

    /// Runs one query file.
    pub fn run_queries(&self, path: &Path) -> QueryFileReport {
        self.queries.run_report(self.db.connection(), path)
    }

    /// Selects every row of each table, in the order given.
    ///
    /// Tables that cannot be read are reported as failures of the returned
    /// report rather than aborting the rest.
    pub fn show_tables<S: AsRef<str>>(&self, tables: &[S]) -> QueryFileReport {
        let mut report = QueryFileReport {
            path: self.db.path().to_path_buf(),
            results: Vec::new(),
            failures: Vec::new(),
        };

        for (index, table) in tables.iter().enumerate() {
            let table = table.as_ref();
            let sql = format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""));
            match execute_statement(self.db.connection(), &sql) {
                Ok(result) => report.results.push(StatementResult {
                    statement: table.to_string(),
                    ..result
                }),
                Err(e) => {
                    warn!("Failed to read table {table}: {e}");
                    report.failures.push(StatementFailure {
                        position: index + 1,
                        statement: table.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Closes the connection. Failures are logged.
    pub fn close(self) {
        self.db.close();
    }

    fn run_phases(&mut self, phases: &[Phase]) -> Result<()> {
        for &phase in phases {
            let path = self.layout.script(phase);
            info!("Running {phase} script: {}", path.display());
            self.run_script(&path)?;
        }
        Ok(())
    }
}
