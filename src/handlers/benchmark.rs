//! `benchmark` command.

use super::{HandlerError, HandlerResult};
use crate::analyzer;
use crate::benchmark::{self, BenchmarkStats, Tally};
use crate::config::Config;
use crate::scan::ScanOrchestrator;
use std::path::{Path, PathBuf};

pub const RESULTS_FILE: &str = "benchmark_results.json";

/// Run the labeled corpus through the configured analyzer. Case files are
/// resolved against `corpus`, or `corpus/` next to the manifest.
pub fn handle_benchmark(
    config: &Config,
    manifest: &Path,
    corpus: Option<&Path>,
    results: Option<&Path>,
) -> Result<HandlerResult, HandlerError> {
    let base = manifest.parent().unwrap_or(Path::new("."));
    let corpus = corpus.map_or_else(|| base.join("corpus"), Path::to_path_buf);
    let results: PathBuf = results.map_or_else(|| base.join(RESULTS_FILE), Path::to_path_buf);

    let cases = benchmark::load_manifest(manifest)?;
    let scanner = ScanOrchestrator::new(analyzer::from_config(&config.analyzer), &config.scan);
    let report = benchmark::run_cases(&cases, &corpus, &scanner)?;
    report.write_results(&results)?;

    print!("{}", format_stats(&report.stats));
    println!("Results written to {}", results.display());

    if report.stats.overall.misclassified() > 0 {
        Ok(HandlerResult::Findings)
    } else {
        Ok(HandlerResult::Success)
    }
}

fn format_row(name: &str, tally: &Tally) -> String {
    format!(
        "{:<20} {:>4} {:>4} {:>4} {:>4}\n",
        name,
        tally.true_positives,
        tally.true_negatives,
        tally.false_positives,
        tally.false_negatives
    )
}

fn format_stats(stats: &BenchmarkStats) -> String {
    let mut out = format!("{:<20} {:>4} {:>4} {:>4} {:>4}\n", "TYPE", "TP", "TN", "FP", "FN");
    for (kind, tally) in &stats.per_type {
        out.push_str(&format_row(kind, tally));
    }
    out.push_str(&format_row("all", &stats.overall));
    out.push_str(&format!("{} case(s)\n", stats.total));
    out
}
