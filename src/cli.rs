use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Severity counts and a findings table
    #[default]
    Summary,
    /// The full scan result as JSON
    Json,
    /// SARIF 2.1.0
    #[value(name = "sarif", alias = "interchange")]
    Sarif,
}

#[derive(Parser, Debug)]
#[command(
    name = "plugin-audit",
    version,
    about = "Resumable batch security scanner for plugin repositories",
    long_about = "plugin-audit keeps a durable worklist of plugin repositories, checks each one out over SVN, git or zip archive, scans it for security findings and records the outcome so interrupted runs resume where they stopped."
)]
pub struct Cli {
    /// Configuration file (defaults to .plugin-audit.yaml or the user config)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Progress store database (overrides store.path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process the next batch of unscanned repositories
    Batch {
        /// Items to process in this run
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip identifiers ordered before this one
        #[arg(long, value_name = "IDENTIFIER")]
        resume_from: Option<String>,

        /// Files analyzed per repository
        #[arg(long)]
        max_files: Option<usize>,

        /// Re-queue items whose last scan failed
        #[arg(long)]
        retry_errors: bool,
    },

    /// Scan a single repository URL or local directory
    Scan {
        /// Repository locator or local directory
        target: String,

        /// Files analyzed
        #[arg(long)]
        max_files: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        output: OutputFormat,
    },

    /// Add repositories to the worklist
    Catalog {
        #[command(subcommand)]
        source: CatalogSource,
    },

    /// Show per-status counts from the progress store
    Status,

    /// Serve scans over HTTP
    Serve {
        /// Listen address (overrides service.listen)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Measure the analyzer against a labeled corpus
    Benchmark {
        /// YAML manifest of `{id, file, type, expected}` cases
        manifest: PathBuf,

        /// Directory holding the case files (defaults to corpus/ beside the manifest)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Per-case results file (defaults to benchmark_results.json beside the manifest)
        #[arg(long)]
        results: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogSource {
    /// Import a JSON array of work items
    Import {
        file: PathBuf,
    },

    /// Fetch popular plugins from the WordPress plugin directory
    Wordpress {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 100)]
        per_page: u32,
    },
}
