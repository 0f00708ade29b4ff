pub mod analyzer;
pub mod batch;
pub mod benchmark;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod handlers;
pub mod logging;
pub mod process;
pub mod reporter;
pub mod rules;
pub mod scan;
pub mod service;
pub mod store;
pub mod workdir;

#[cfg(test)]
pub mod test_utils;

pub use analyzer::{Analyzer, AnalyzerError, Language};
pub use batch::{BatchError, BatchOptions, BatchReport, BatchRunner};
pub use cli::{Cli, OutputFormat};
pub use config::Config;
pub use fetch::{FetchError, FetchResult, Fetcher, VcsFetcher};
pub use reporter::{
    Reporter, json::JsonReporter, sarif::SarifReporter, terminal::TerminalReporter,
};
pub use rules::{Finding, PatternAnalyzer, ScanResult, Severity, Summary};
pub use scan::ScanOrchestrator;
pub use store::{Outcome, ProgressStore, ScanStatus, StoreError, TransportKind, WorkItem};
pub use workdir::{ScopedDir, WorkingDirectory};
