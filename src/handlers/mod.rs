//! CLI command handlers.
//!
//! This module contains all the handler functions for CLI commands,
//! separated from main.rs to enable unit testing.

mod batch;
mod benchmark;
mod catalog;
mod error;
mod scan;
mod serve;
mod status;

use std::path::Path;
use std::process::ExitCode;
use tracing::error;

pub use batch::handle_batch;
pub use benchmark::handle_benchmark;
pub use catalog::{handle_catalog_import, handle_catalog_wordpress};
pub use error::HandlerError;
pub use scan::handle_scan;
pub use serve::handle_serve;
pub use status::handle_status;

use crate::cli::{CatalogSource, Cli, Command};
use crate::config::Config;
use crate::store::ProgressStore;

/// Exit code of a fatal error: bad config, single-shot fetch failure or a
/// store integrity error.
pub const EXIT_FATAL: u8 = 2;

/// Result type for handler functions that can be tested.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    Success,
    /// Findings were reported, or a batch recorded failures.
    Findings,
}

impl From<HandlerResult> for ExitCode {
    fn from(result: HandlerResult) -> Self {
        match result {
            HandlerResult::Success => ExitCode::SUCCESS,
            HandlerResult::Findings => ExitCode::from(1),
        }
    }
}

/// Load configuration and apply the global `--db` override.
pub fn load_config(cli: &Cli) -> Result<Config, HandlerError> {
    let mut config = Config::resolve(cli.config.as_deref(), Some(Path::new(".")))?;
    if let Some(db) = &cli.db {
        config.store.path = db.clone();
    }
    Ok(config)
}

pub(crate) fn open_store(config: &Config) -> Result<ProgressStore, HandlerError> {
    Ok(ProgressStore::open(&config.store.path)?)
}

/// Run the parsed command line.
pub fn dispatch(cli: &Cli) -> ExitCode {
    let result = load_config(cli).and_then(|config| match &cli.command {
        Command::Batch {
            limit,
            resume_from,
            max_files,
            retry_errors,
        } => handle_batch(
            &config,
            *limit,
            resume_from.clone(),
            *max_files,
            *retry_errors,
        ),
        Command::Scan {
            target,
            max_files,
            output,
        } => handle_scan(&config, target, *max_files, *output),
        Command::Catalog { source } => match source {
            CatalogSource::Import { file } => handle_catalog_import(&config, file),
            CatalogSource::Wordpress { page, per_page } => {
                handle_catalog_wordpress(&config, *page, *per_page)
            }
        },
        Command::Status => handle_status(&config),
        Command::Serve { listen } => handle_serve(&config, listen.as_deref()),
        Command::Benchmark {
            manifest,
            corpus,
            results,
        } => handle_benchmark(&config, manifest, corpus.as_deref(), results.as_deref()),
    });

    match result {
        Ok(result) => result.into(),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
