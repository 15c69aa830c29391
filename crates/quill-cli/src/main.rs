//! Quill CLI Application
//!
//! Command-line interface for the Quill SQL pipeline. Every invocation opens
//! one database connection, runs one command and closes the connection again,
//! whether or not the command succeeded.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::{Cli, ShowArgs};
use log::info;
use quill_core::PipelineBuilder;
use renderer::TerminalRenderer;
use Commands::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Args {
        database_file,
        project_dir,
        no_color,
        format,
        tolerate_columns,
        foreign_keys,
        command,
    } = Args::parse();

    let pipeline = tolerate_columns
        .into_iter()
        .fold(PipelineBuilder::new(), PipelineBuilder::tolerate_existing_column)
        .with_database_path(database_file)
        .with_project_dir(project_dir)
        .with_foreign_keys(foreign_keys)
        .build()
        .context("Failed to initialize pipeline")?;

    let mut cli = Cli::new(pipeline, TerminalRenderer::new(!no_color), format);

    info!("Quill started");

    let result = match command {
        Some(Load) => cli.load(),
        Some(Create) => cli.create(),
        Some(Features) => cli.features(),
        Some(Analyze) => cli.analyze(),
        Some(Run) => cli.run_all(),
        Some(Exec(args)) => cli.exec(args),
        Some(Query(args)) => cli.query(args),
        Some(Show(args)) => cli.show(args),
        None => cli.show(ShowArgs {
            tables: vec!["authors".to_string(), "books".to_string()],
        }),
    };

    cli.close();
    result
}
