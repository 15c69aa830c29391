use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::{ExecArgs, QueryArgs, ShowArgs};

/// Populate a SQLite database from CSV files and SQL scripts, then run
/// analytical query files
///
/// Quill works on a project directory laid out as `data/*.csv`,
/// `sql_create/`, `sql_features/` and `sql_queries/`. Each command runs one
/// phase of the pipeline against a single database connection.
#[derive(Parser)]
#[command(version, about, name = "quill")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/quill/db.sqlite
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Project directory containing the data and SQL folders
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Additional column whose "already exists" error marks a script as
    /// already applied (book_price is always tolerated)
    #[arg(long = "tolerate-column", global = true, value_name = "COLUMN")]
    pub tolerate_columns: Vec<String>,

    /// Enforce foreign key constraints on the connection
    #[arg(long, global = true)]
    pub foreign_keys: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown tables
    Text,
    /// JSON documents
    Json,
}

/// Available commands for the Quill CLI
///
/// Phase commands (`load`, `create`, `features`, `analyze`, `run`) use the
/// project layout; `exec` and `query` take explicit file paths.
#[derive(Subcommand)]
pub enum Commands {
    /// Replace the authors and books tables with the project's CSV files
    #[command(alias = "l")]
    Load,
    /// Drop and recreate the schema
    #[command(alias = "c")]
    Create,
    /// Insert seed rows, then apply the update and delete scripts
    #[command(alias = "f")]
    Features,
    /// Apply the pricing script and run every query file
    #[command(alias = "a")]
    Analyze,
    /// Run every phase: load, create, features, analyze
    Run,
    /// Execute mutating SQL scripts, each as one transaction
    #[command(alias = "x")]
    Exec(ExecArgs),
    /// Run query files statement by statement
    #[command(alias = "q")]
    Query(QueryArgs),
    /// Print every row of the given tables
    #[command(alias = "s")]
    Show(ShowArgs),
}
