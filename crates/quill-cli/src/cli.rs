//! Command handlers for the CLI.
//!
//! Each handler runs one pipeline operation and writes its outcome either as
//! markdown through the [`TerminalRenderer`] or as JSON on stdout. Logging goes
//! to stderr, so the two never mix.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use quill_core::{
    LoadSummaries, OperationStatus, Pipeline, QueryFileReport, Reports, ScriptOutcome,
};
use serde::Serialize;

use crate::{args::OutputFormat, renderer::TerminalRenderer};

/// Execute mutating SQL scripts
///
/// Each script runs as a single transaction. Scripts run in the order given
/// and the first failure stops the command.
#[derive(Args)]
pub struct ExecArgs {
    /// SQL script files to execute
    #[arg(required = true, help = "SQL script files to execute, in order")]
    pub scripts: Vec<PathBuf>,
}

/// Run query files
///
/// Statements are split on `;` and run independently. A failing statement or
/// a missing file is reported and skipped.
#[derive(Args)]
pub struct QueryArgs {
    /// Query files to run
    #[arg(required = true, help = "SQL query files to run, in order")]
    pub files: Vec<PathBuf>,
}

/// Print every row of the given tables
#[derive(Args)]
pub struct ShowArgs {
    /// Tables to print
    #[arg(default_values = ["authors", "books"])]
    pub tables: Vec<String>,
}

/// JSON form of a script run.
#[derive(Serialize)]
struct ScriptStatus {
    script: String,
    #[serde(flatten)]
    outcome: ScriptOutcome,
}

pub struct Cli {
    pipeline: Pipeline,
    renderer: TerminalRenderer,
    format: OutputFormat,
}

impl Cli {
    pub fn new(pipeline: Pipeline, renderer: TerminalRenderer, format: OutputFormat) -> Self {
        Self {
            pipeline,
            renderer,
            format,
        }
    }

    /// Closes the database connection.
    pub fn close(self) {
        self.pipeline.close();
    }

    pub fn load(&mut self) -> Result<()> {
        let summaries = self
            .pipeline
            .load_sources()
            .context("Failed to load CSV sources")?;

        match self.format {
            OutputFormat::Text => self.renderer.render(&LoadSummaries(summaries).to_string()),
            OutputFormat::Json => print_json(&summaries),
        }
    }

    pub fn create(&mut self) -> Result<()> {
        self.pipeline
            .create_schema()
            .context("Failed to create schema")?;
        self.status("Schema created")
    }

    pub fn features(&mut self) -> Result<()> {
        self.pipeline
            .apply_features()
            .context("Failed to apply feature scripts")?;
        self.status("Feature engineering operations completed")
    }

    pub fn analyze(&mut self) -> Result<()> {
        let reports = self.pipeline.analyze().context("Analysis failed")?;
        self.reports(reports)
    }

    pub fn run_all(&mut self) -> Result<()> {
        let reports = self.pipeline.run_all().context("Pipeline run failed")?;
        self.reports(reports)
    }

    pub fn exec(&mut self, args: ExecArgs) -> Result<()> {
        let mut statuses = Vec::with_capacity(args.scripts.len());
        for script in &args.scripts {
            let outcome = self
                .pipeline
                .run_script(script)
                .with_context(|| format!("Failed to execute {}", script.display()))?;
            statuses.push(ScriptStatus {
                script: script.display().to_string(),
                outcome,
            });
        }

        match self.format {
            OutputFormat::Text => {
                let text = statuses
                    .iter()
                    .map(|s| OperationStatus::for_script(&s.script, &s.outcome).to_string())
                    .collect::<String>();
                self.renderer.render(&text)
            }
            OutputFormat::Json => print_json(&statuses),
        }
    }

    pub fn query(&self, args: QueryArgs) -> Result<()> {
        let reports = args
            .files
            .iter()
            .map(|file| self.pipeline.run_queries(file))
            .collect();
        self.reports(reports)
    }

    pub fn show(&self, args: ShowArgs) -> Result<()> {
        let report = self.pipeline.show_tables(&args.tables);
        self.reports(vec![report])
    }

    fn status(&self, message: &str) -> Result<()> {
        match self.format {
            OutputFormat::Text => self
                .renderer
                .render(&OperationStatus::success(message).to_string()),
            OutputFormat::Json => print_json(&serde_json::json!({ "status": message })),
        }
    }

    fn reports(&self, reports: Vec<QueryFileReport>) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.renderer.render(&Reports(reports).to_string()),
            OutputFormat::Json => {
                let values = reports
                    .iter()
                    .map(QueryFileReport::to_json)
                    .collect::<quill_core::Result<Vec<_>>>()
                    .context("Failed to serialize results")?;
                print_json(&values)
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
