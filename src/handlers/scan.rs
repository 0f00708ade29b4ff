//! `scan` command: one repository, no progress store.

use super::{HandlerError, HandlerResult};
use crate::analyzer;
use crate::batch::fetch_and_scan;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::fetch::VcsFetcher;
use crate::reporter::Reporter;
use crate::reporter::json::JsonReporter;
use crate::reporter::sarif::SarifReporter;
use crate::reporter::terminal::TerminalReporter;
use crate::rules::ScanResult;
use crate::scan::ScanOrchestrator;
use crate::store::WorkItem;
use std::path::Path;
use tracing::info;

pub fn handle_scan(
    config: &Config,
    target: &str,
    max_files: Option<usize>,
    output: OutputFormat,
) -> Result<HandlerResult, HandlerError> {
    let max_files = max_files.unwrap_or(config.scan.max_files);
    let scanner = ScanOrchestrator::new(analyzer::from_config(&config.analyzer), &config.scan);

    let local = Path::new(target);
    let findings = if local.is_dir() {
        info!(path = %local.display(), "Scanning local directory");
        scanner.scan(local, max_files)
    } else if local.is_file() {
        info!(path = %local.display(), "Scanning local file");
        scanner.scan_file(local)
    } else {
        let item = WorkItem::from_locator(target);
        info!(identifier = %item.identifier, transport = %item.transport_kind, "Scanning repository");
        let fetcher = VcsFetcher::from_config(&config.fetch);
        fetch_and_scan(&fetcher, &scanner, &item, max_files)?
    };

    let result = ScanResult::new(target, findings);
    println!("{}", render(&result, output));

    if result.findings.is_empty() {
        Ok(HandlerResult::Success)
    } else {
        Ok(HandlerResult::Findings)
    }
}

pub fn render(result: &ScanResult, output: OutputFormat) -> String {
    match output {
        OutputFormat::Summary => TerminalReporter::new().report(result),
        OutputFormat::Json => JsonReporter::new().report(result),
        OutputFormat::Sarif => SarifReporter::new().report(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_config;
    use crate::test_utils::fixtures::rce_finding;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_local_directory_with_findings() {
        let dir = TempDir::new().unwrap();
        let plugin = dir.path().join("plugin");
        fs::create_dir_all(&plugin).unwrap();
        fs::write(
            plugin.join("run.php"),
            "<?php\n$out = shell_exec($_GET['cmd']);\n",
        )
        .unwrap();

        let config = test_config::in_dir(&dir);
        let result =
            handle_scan(&config, plugin.to_str().unwrap(), None, OutputFormat::Json).unwrap();
        assert_eq!(result, HandlerResult::Findings);
        assert!(plugin.join("run.php").exists());
    }

    #[test]
    fn test_scan_local_file_with_findings() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("shell.php");
        fs::write(&file, "<?php\n$out = shell_exec($_GET['cmd']);\n").unwrap();

        let config = test_config::in_dir(&dir);
        let result =
            handle_scan(&config, file.to_str().unwrap(), None, OutputFormat::Json).unwrap();
        assert_eq!(result, HandlerResult::Findings);
        assert!(!dir.path().join("work").exists());
    }

    #[test]
    fn test_scan_clean_local_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hello.php");
        fs::write(&file, "<?php\necho 'hello';\n").unwrap();
        let config = test_config::in_dir(&dir);
        let result =
            handle_scan(&config, file.to_str().unwrap(), None, OutputFormat::Summary).unwrap();
        assert_eq!(result, HandlerResult::Success);
    }

    #[test]
    fn test_scan_clean_local_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hello.php"), "<?php\necho 'hello';\n").unwrap();
        let config = test_config::in_dir(&dir);
        let result = handle_scan(
            &config,
            dir.path().to_str().unwrap(),
            Some(5),
            OutputFormat::Summary,
        )
        .unwrap();
        assert_eq!(result, HandlerResult::Success);
    }

    #[test]
    fn test_scan_fetch_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let config = test_config::in_dir(&dir);
        let missing = format!("file://{}", dir.path().join("missing.zip").display());
        let err = handle_scan(&config, &missing, None, OutputFormat::Summary).unwrap_err();
        assert!(matches!(err, HandlerError::Fetch(_)));
    }

    #[test]
    fn test_render_formats() {
        let result = ScanResult::new("demo", vec![rce_finding()]);
        assert!(render(&result, OutputFormat::Summary).contains("Target: demo"));
        let json: serde_json::Value =
            serde_json::from_str(&render(&result, OutputFormat::Json)).unwrap();
        assert_eq!(json["findings"][0]["type"], "rce");
        let sarif: serde_json::Value =
            serde_json::from_str(&render(&result, OutputFormat::Sarif)).unwrap();
        assert_eq!(sarif["version"], "2.1.0");
    }
}
