//! File selection and analyzer dispatch over a fetched source tree.

use crate::analyzer::{Analyzer, Language};
use crate::config::ScanConfig;
use crate::rules::Finding;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Version-control metadata directories never worth scanning.
const SKIPPED_DIRS: &[&str] = &[".git", ".svn", ".hg", "node_modules"];

/// Walks a scan root, selects eligible files under a budget and runs the
/// analyzer over each.
pub struct ScanOrchestrator<A> {
    analyzer: A,
    extensions: Vec<String>,
    /// Files larger than this many bytes are skipped. 0 disables the ceiling.
    max_file_size: u64,
}

impl<A: Analyzer> ScanOrchestrator<A> {
    pub fn new(analyzer: A, config: &ScanConfig) -> Self {
        Self {
            analyzer,
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_file_size: config.max_file_size,
        }
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    fn within_size(&self, entry: &DirEntry) -> bool {
        if self.max_file_size == 0 {
            return true;
        }
        match entry.metadata() {
            Ok(meta) => meta.len() <= self.max_file_size,
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                false
            }
        }
    }

    /// Eligible files under `scan_root` in traversal order (entries sorted by
    /// name within each directory), at most `max_files` of them. `max_files`
    /// of 0 means no limit.
    pub fn select_files(&self, scan_root: &Path, max_files: usize) -> Vec<PathBuf> {
        let limit = if max_files == 0 { usize::MAX } else { max_files };

        WalkDir::new(scan_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches_extension(e.path()))
            .filter(|e| self.within_size(e))
            .take(limit)
            .map(|e| e.into_path())
            .collect()
    }

    /// Analyze up to `max_files` eligible files and return their normalized
    /// findings in first-seen order.
    pub fn scan(&self, scan_root: &Path, max_files: usize) -> Vec<Finding> {
        let files = self.select_files(scan_root, max_files);
        debug!(root = %scan_root.display(), files = files.len(), "Selected files for analysis");

        let mut findings = Vec::new();
        let mut failed = 0usize;

        for path in &files {
            let relative = relative_path(scan_root, path);
            match self.analyze_file(path, &relative) {
                Some(found) => findings.extend(found),
                None => failed += 1,
            }
        }

        debug!(
            root = %scan_root.display(),
            files = files.len(),
            failed,
            findings = findings.len(),
            "Scan complete"
        );
        findings
    }

    /// Analyze one file outside any scan root. Findings are reported
    /// against the file name; no extension filter or size ceiling applies.
    pub fn scan_file(&self, path: &Path) -> Vec<Finding> {
        let relative = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.analyze_file(path, &relative).unwrap_or_default()
    }

    /// Read, decode and analyze one file. `None` when the file could not be
    /// read or the analyzer failed; both are logged.
    fn analyze_file(&self, path: &Path, relative: &str) -> Option<Vec<Finding>> {
        let content = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(file = %relative, error = %e, "Failed to read file");
                return None;
            }
        };

        let language = Language::from_path(path);
        trace!(file = %relative, language = %language, bytes = content.len(), "Analyzing file");

        match self.analyzer.analyze(&content, relative, language) {
            Ok(found) => Some(found.into_iter().map(|f| f.normalize(relative)).collect()),
            Err(e) => {
                warn!(file = %relative, error = %e, "Analyzer failed, continuing");
                None
            }
        }
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// `path` relative to `root`, with `/` separators.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
