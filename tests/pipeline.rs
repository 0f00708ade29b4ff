//! End-to-end pipeline scenarios against the library API.

use plugin_audit::config::{FetchConfig, ScanConfig};
use plugin_audit::{
    Analyzer, AnalyzerError, BatchOptions, BatchRunner, FetchError, FetchResult, Fetcher,
    Finding, Language, ProgressStore, ScanOrchestrator, ScanStatus, Severity, TransportKind,
    VcsFetcher, WorkItem, WorkingDirectory,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Reports one high `rce` finding for every file containing `shell_exec`
/// and records the files it was given.
#[derive(Default)]
struct RecordingAnalyzer {
    files: Mutex<Vec<String>>,
    panic_on: Option<String>,
}

impl RecordingAnalyzer {
    fn panicking_on(file: &str) -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            panic_on: Some(file.to_string()),
        }
    }

    fn files(&self) -> Vec<String> {
        self.files.lock().unwrap().clone()
    }
}

impl Analyzer for RecordingAnalyzer {
    fn analyze(
        &self,
        content: &str,
        file_path: &str,
        _language: Language,
    ) -> Result<Vec<Finding>, AnalyzerError> {
        self.files.lock().unwrap().push(file_path.to_string());
        if self.panic_on.as_deref() == Some(file_path) {
            panic!("analyzer crashed on {file_path}");
        }
        if !content.contains("shell_exec") {
            return Ok(vec![]);
        }
        Ok(vec![Finding {
            file: file_path.to_string(),
            line: 2,
            kind: "rce".to_string(),
            severity: Severity::High,
            description: "shell_exec with user input".to_string(),
            ..Finding::default()
        }])
    }
}

/// Fetcher that produces an empty tree for every item.
struct EmptyTreeFetcher {
    workdir: WorkingDirectory,
}

impl Fetcher for EmptyTreeFetcher {
    fn fetch(&self, item: &WorkItem) -> Result<FetchResult, FetchError> {
        let dir = self
            .workdir
            .acquire(&item.identifier)
            .map_err(|e| FetchError::Layout {
                identifier: item.identifier.clone(),
                message: e.to_string(),
            })?;
        Ok(FetchResult::new(dir.path().to_path_buf(), dir))
    }
}

fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn fetch_config(dir: &TempDir) -> FetchConfig {
    FetchConfig {
        work_dir: Some(dir.path().join("work")),
        ..FetchConfig::default()
    }
}

fn work_entries(dir: &TempDir) -> usize {
    match fs::read_dir(dir.path().join("work")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn archive_item(identifier: &str, zip: &Path) -> WorkItem {
    WorkItem::new(identifier, identifier, file_url(zip), TransportKind::Archive)
}

#[test]
fn archive_item_with_bad_file_is_recorded_ok_with_one_finding() {
    let dir = TempDir::new().unwrap();
    let zip = dir.path().join("shell-plugin.zip");
    write_zip(
        &zip,
        &[(
            "shell-plugin/shell.php",
            "<?php\n$out = shell_exec($_GET['cmd']);\n",
        )],
    );

    let store = ProgressStore::open_in_memory().unwrap();
    store.upsert(&archive_item("shell-plugin", &zip)).unwrap();

    let analyzer = RecordingAnalyzer::default();
    let runner = BatchRunner::new(
        &store,
        VcsFetcher::from_config(&fetch_config(&dir)),
        ScanOrchestrator::new(&analyzer, &ScanConfig::default()),
    );
    let report = runner.run(&BatchOptions::default()).unwrap();

    assert_eq!(report.items.len(), 1);
    let item = store.get("shell-plugin").unwrap().unwrap();
    let outcome = item.last_outcome.unwrap();
    assert_eq!(outcome.status, ScanStatus::Ok);
    assert_eq!(outcome.finding_count, 1);
    assert!(outcome.error_detail.is_none());

    // The single top-level folder is the scan root.
    assert_eq!(analyzer.files(), vec!["shell.php"]);
    assert_eq!(work_entries(&dir), 0);
}

#[cfg(unix)]
#[test]
fn fetch_timeout_is_recorded_as_error_and_directory_removed() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let hang = dir.path().join("hanging-svn");
    fs::write(&hang, "#!/bin/sh\nexec sleep 30\n").unwrap();
    fs::set_permissions(&hang, fs::Permissions::from_mode(0o755)).unwrap();

    let config = FetchConfig {
        svn_program: hang.display().to_string(),
        clone_timeout_secs: 1,
        ..fetch_config(&dir)
    };

    let store = ProgressStore::open_in_memory().unwrap();
    store
        .upsert(&WorkItem::new(
            "slow-plugin",
            "Slow Plugin",
            "https://plugins.svn.wordpress.org/slow-plugin",
            TransportKind::Svn,
        ))
        .unwrap();

    let analyzer = RecordingAnalyzer::default();
    let runner = BatchRunner::new(
        &store,
        VcsFetcher::from_config(&config),
        ScanOrchestrator::new(&analyzer, &ScanConfig::default()),
    );
    runner.run(&BatchOptions::default()).unwrap();

    let outcome = store
        .get("slow-plugin")
        .unwrap()
        .unwrap()
        .last_outcome
        .unwrap();
    assert_eq!(outcome.status, ScanStatus::Error);
    assert_eq!(outcome.finding_count, -1);
    let detail = outcome.error_detail.unwrap();
    assert!(detail.starts_with("timeout"), "detail was {detail}");
    assert!(detail.chars().count() <= 120);

    assert!(analyzer.files().is_empty());
    assert_eq!(work_entries(&dir), 0);
}

#[test]
fn max_files_limits_analyzer_calls_deterministically() {
    let dir = TempDir::new().unwrap();
    let zip = dir.path().join("five.zip");
    write_zip(
        &zip,
        &[
            ("five/e.php", "<?php"),
            ("five/c.php", "<?php"),
            ("five/a.php", "<?php"),
            ("five/d.php", "<?php"),
            ("five/b.php", "<?php"),
        ],
    );

    let mut seen = Vec::new();
    for _ in 0..2 {
        let store = ProgressStore::open_in_memory().unwrap();
        store.upsert(&archive_item("five", &zip)).unwrap();

        let analyzer = RecordingAnalyzer::default();
        let runner = BatchRunner::new(
            &store,
            VcsFetcher::from_config(&fetch_config(&dir)),
            ScanOrchestrator::new(&analyzer, &ScanConfig::default()),
        );
        runner
            .run(&BatchOptions {
                max_files: 2,
                ..BatchOptions::default()
            })
            .unwrap();

        assert_eq!(analyzer.files().len(), 2);
        seen.push(analyzer.files());
    }
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0], vec!["a.php", "b.php"]);
}

#[test]
fn analyzer_panic_leaves_no_directory_behind() {
    let dir = TempDir::new().unwrap();
    let zip = dir.path().join("crashy.zip");
    write_zip(
        &zip,
        &[("crashy/a.php", "<?php"), ("crashy/boom.php", "<?php")],
    );

    let store = ProgressStore::open_in_memory().unwrap();
    store.upsert(&archive_item("crashy", &zip)).unwrap();
    store
        .upsert(&archive_item("zz-after", &dir.path().join("missing.zip")))
        .unwrap();

    let before = work_entries(&dir);
    let analyzer = RecordingAnalyzer::panicking_on("boom.php");
    let runner = BatchRunner::new(
        &store,
        VcsFetcher::from_config(&fetch_config(&dir)),
        ScanOrchestrator::new(&analyzer, &ScanConfig::default()),
    );
    let report = runner.run(&BatchOptions::default()).unwrap();

    assert_eq!(work_entries(&dir), before);
    assert_eq!(report.items.len(), 2);

    let crashy = store.get("crashy").unwrap().unwrap().last_outcome.unwrap();
    assert_eq!(crashy.status, ScanStatus::Error);
    assert!(crashy.error_detail.unwrap().starts_with("panic"));

    // The loop carried on to the next item.
    let after = store.get("zz-after").unwrap().unwrap();
    assert_eq!(after.status(), ScanStatus::Error);
}

#[test]
fn interrupted_batch_resumes_with_remaining_items() {
    let dir = TempDir::new().unwrap();
    let store = ProgressStore::open_in_memory().unwrap();
    for id in ["d", "b", "a", "c"] {
        store
            .upsert(&WorkItem::new(
                id,
                id,
                format!("https://example.com/{id}.zip"),
                TransportKind::Archive,
            ))
            .unwrap();
    }

    let analyzer = RecordingAnalyzer::default();
    let fetcher = EmptyTreeFetcher {
        workdir: WorkingDirectory::new(dir.path().join("work")),
    };
    let runner = BatchRunner::new(
        &store,
        fetcher,
        ScanOrchestrator::new(&analyzer, &ScanConfig::default()),
    );

    // A prior run finished `a`; this one stops after recording `b`.
    let first = runner
        .run(&BatchOptions {
            limit: 1,
            ..BatchOptions::default()
        })
        .unwrap();
    assert_eq!(first.items[0].identifier, "a");
    let second = runner
        .run(&BatchOptions {
            limit: 1,
            ..BatchOptions::default()
        })
        .unwrap();
    assert_eq!(second.items[0].identifier, "b");

    let remaining: Vec<String> = store
        .next_batch(10, None)
        .unwrap()
        .into_iter()
        .map(|item| item.identifier)
        .collect();
    assert_eq!(remaining, vec!["c", "d"]);

    let resumed: Vec<String> = store
        .next_batch(10, Some("d"))
        .unwrap()
        .into_iter()
        .map(|item| item.identifier)
        .collect();
    assert_eq!(resumed, vec!["d"]);
}

#[test]
fn every_pending_item_has_an_outcome_after_one_run() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.zip");
    write_zip(&good, &[("good/index.php", "<?php echo 1;")]);
    let empty = dir.path().join("empty.zip");
    write_zip(&empty, &[]);

    let store = ProgressStore::open_in_memory().unwrap();
    let items = vec![
        archive_item("good", &good),
        archive_item("empty", &empty),
        archive_item("missing", &dir.path().join("missing.zip")),
        WorkItem::new(
            "broken-git",
            "broken-git",
            file_url(&dir.path().join("no-such-repo")),
            TransportKind::GitHosted,
        ),
    ];
    for item in &items {
        store.upsert(item).unwrap();
    }

    let analyzer = RecordingAnalyzer::default();
    let runner = BatchRunner::new(
        &store,
        VcsFetcher::from_config(&fetch_config(&dir)),
        ScanOrchestrator::new(&analyzer, &ScanConfig::default()),
    );
    runner
        .run(&BatchOptions {
            limit: items.len(),
            ..BatchOptions::default()
        })
        .unwrap();

    for item in &items {
        let stored = store.get(&item.identifier).unwrap().unwrap();
        assert_ne!(stored.status(), ScanStatus::Pending, "{}", item.identifier);
    }
    assert_eq!(
        store.get("good").unwrap().unwrap().status(),
        ScanStatus::Ok
    );
    assert_eq!(
        store.get("empty").unwrap().unwrap().status(),
        ScanStatus::Error
    );
    assert!(store.next_batch(10, None).unwrap().is_empty());
    assert_eq!(work_entries(&dir), 0);
}

#[test]
fn recatalog_after_scan_keeps_outcome() {
    let dir = TempDir::new().unwrap();
    let zip = dir.path().join("p.zip");
    write_zip(&zip, &[("p/a.php", "<?php")]);

    let store = ProgressStore::open_in_memory().unwrap();
    let item = archive_item("p", &zip);
    store.upsert(&item).unwrap();

    let analyzer = RecordingAnalyzer::default();
    let runner = BatchRunner::new(
        &store,
        VcsFetcher::from_config(&fetch_config(&dir)),
        ScanOrchestrator::new(&analyzer, &ScanConfig::default()),
    );
    runner.run(&BatchOptions::default()).unwrap();
    let before = store.get("p").unwrap().unwrap();

    store.upsert(&item).unwrap();
    store.upsert(&item).unwrap();
    let after = store.get("p").unwrap().unwrap();
    assert_eq!(before, after);
    assert!(store.next_batch(10, None).unwrap().is_empty());
}
