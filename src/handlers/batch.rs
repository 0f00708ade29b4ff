//! `batch` command.

use super::{HandlerError, HandlerResult, open_store};
use crate::analyzer;
use crate::batch::{BatchOptions, BatchReport, BatchRunner};
use crate::config::Config;
use crate::fetch::VcsFetcher;
use crate::scan::ScanOrchestrator;
use crate::store::ScanStatus;

pub fn handle_batch(
    config: &Config,
    limit: Option<usize>,
    resume_from: Option<String>,
    max_files: Option<usize>,
    retry_errors: bool,
) -> Result<HandlerResult, HandlerError> {
    let store = open_store(config)?;
    let fetcher = VcsFetcher::from_config(&config.fetch);
    let scanner = ScanOrchestrator::new(analyzer::from_config(&config.analyzer), &config.scan);
    let runner = BatchRunner::new(&store, fetcher, scanner);

    let options = BatchOptions {
        limit: limit.unwrap_or(config.batch.limit),
        resume_from,
        max_files: max_files.unwrap_or(config.scan.max_files),
        retry_errors,
    };
    let report = runner.run(&options)?;
    print!("{}", format_report(&report));

    if report.failed() > 0 {
        Ok(HandlerResult::Findings)
    } else {
        Ok(HandlerResult::Success)
    }
}

fn format_report(report: &BatchReport) -> String {
    let mut output = String::new();
    if report.items.is_empty() {
        output.push_str("No unscanned items.\n");
        return output;
    }

    for item in &report.items {
        match item.status {
            ScanStatus::Ok => output.push_str(&format!(
                "ok     {} ({} findings)\n",
                item.identifier, item.finding_count
            )),
            _ => output.push_str(&format!(
                "error  {}: {}\n",
                item.identifier,
                item.error_detail.as_deref().unwrap_or_default()
            )),
        }
    }
    output.push_str(&format!(
        "Processed {} item(s): {} ok, {} failed, {} finding(s)\n",
        report.items.len(),
        report.succeeded(),
        report.failed(),
        report.total_findings()
    ));
    output
}
