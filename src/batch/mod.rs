//! The batch control loop: dequeue, fetch, scan, record, clean up.
//!
//! Items are processed one at a time in identifier order. Every failure
//! while fetching or scanning an item (including a panic) becomes that
//! item's recorded `Error` outcome; only store errors end the loop.

mod error;

pub use error::BatchError;

use crate::analyzer::Analyzer;
use crate::fetch::{FetchError, Fetcher};
use crate::rules::Finding;
use crate::scan::ScanOrchestrator;
use crate::store::{Outcome, ProgressStore, ScanStatus, WorkItem};
use chrono::Utc;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Maximum length of a recorded error detail.
pub const MAX_DETAIL_CHARS: usize = 120;

/// Per-item processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Queued,
    Fetching,
    Scanning,
    Recording,
    Done,
    Failed,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Queued => "queued",
            ItemState::Fetching => "fetching",
            ItemState::Scanning => "scanning",
            ItemState::Recording => "recording",
            ItemState::Done => "done",
            ItemState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub limit: usize,
    pub resume_from: Option<String>,
    pub max_files: usize,
    /// Put items whose last attempt failed back in the queue first.
    pub retry_errors: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            resume_from: None,
            max_files: 30,
            retry_errors: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub identifier: String,
    pub status: ScanStatus,
    pub finding_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub requeued: usize,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ScanStatus::Ok)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ScanStatus::Error)
            .count()
    }

    pub fn total_findings(&self) -> i64 {
        self.items
            .iter()
            .filter(|i| i.status == ScanStatus::Ok)
            .map(|i| i.finding_count)
            .sum()
    }
}

/// Fetch `item`, scan its tree and release the fetched directory, whatever
/// the scan did.
pub fn fetch_and_scan<F, A>(
    fetcher: &F,
    scanner: &ScanOrchestrator<A>,
    item: &WorkItem,
    max_files: usize,
) -> Result<Vec<Finding>, FetchError>
where
    F: Fetcher + ?Sized,
    A: Analyzer,
{
    let fetched = fetcher.fetch(item)?;
    debug!(identifier = %item.identifier, state = ItemState::Scanning.as_str(), "State transition");

    // Dropping `fetched` during a panic still removes the directory
    let findings = scanner.scan(fetched.scan_root(), max_files);

    let cleanup_root = fetched.cleanup_root().to_path_buf();
    if let Err(e) = fetched.release() {
        warn!(identifier = %item.identifier, path = %cleanup_root.display(), error = %e, "Failed to release working directory");
    }
    Ok(findings)
}

pub struct BatchRunner<'a, F, A> {
    store: &'a ProgressStore,
    fetcher: F,
    scanner: ScanOrchestrator<A>,
}

impl<'a, F: Fetcher, A: Analyzer> BatchRunner<'a, F, A> {
    pub fn new(store: &'a ProgressStore, fetcher: F, scanner: ScanOrchestrator<A>) -> Self {
        Self {
            store,
            fetcher,
            scanner,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn scanner(&self) -> &ScanOrchestrator<A> {
        &self.scanner
    }

    /// Process the next batch. Each item's outcome is recorded before the
    /// next item is fetched.
    pub fn run(&self, options: &BatchOptions) -> Result<BatchReport, BatchError> {
        let mut report = BatchReport::default();

        if options.retry_errors {
            report.requeued = self.store.clear_outcomes(ScanStatus::Error)?;
            if report.requeued > 0 {
                info!(count = report.requeued, "Re-queued failed items");
            }
        }

        let items = self
            .store
            .next_batch(options.limit, options.resume_from.as_deref())?;
        info!(count = items.len(), limit = options.limit, resume_from = ?options.resume_from, "Starting batch");

        for item in &items {
            let outcome = self.attempt(item, options.max_files);

            debug!(identifier = %item.identifier, state = ItemState::Recording.as_str(), "State transition");
            self.store.record_outcome(&item.identifier, &outcome)?;

            match outcome.status {
                ScanStatus::Ok => info!(
                    identifier = %item.identifier,
                    findings = outcome.finding_count,
                    "Scanned"
                ),
                _ => warn!(
                    identifier = %item.identifier,
                    error = outcome.error_detail.as_deref().unwrap_or_default(),
                    "Scan failed"
                ),
            }

            report.items.push(ItemReport {
                identifier: item.identifier.clone(),
                status: outcome.status,
                finding_count: outcome.finding_count,
                error_detail: outcome.error_detail,
            });
        }

        info!(
            processed = report.items.len(),
            ok = report.succeeded(),
            failed = report.failed(),
            findings = report.total_findings(),
            "Batch finished"
        );
        Ok(report)
    }

    /// Fetch and scan one item, turning every failure into an `Error` outcome.
    pub fn attempt(&self, item: &WorkItem, max_files: usize) -> Outcome {
        debug!(identifier = %item.identifier, transport = %item.transport_kind, state = ItemState::Queued.as_str(), "State transition");
        debug!(identifier = %item.identifier, state = ItemState::Fetching.as_str(), "State transition");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            fetch_and_scan(&self.fetcher, &self.scanner, item, max_files)
        }));

        let outcome = match result {
            Ok(Ok(findings)) => Outcome::ok(findings.len(), Utc::now()),
            Ok(Err(e)) => {
                if let Some(stderr) = e.exit_detail() {
                    debug!(identifier = %item.identifier, stderr = %stderr, "Fetch error output");
                }
                Outcome::error(
                    truncate_detail(&format!("{}: {}", e.reason(), e)),
                    Utc::now(),
                )
            }
            Err(payload) => Outcome::error(
                truncate_detail(&format!("panic: {}", panic_message(payload.as_ref()))),
                Utc::now(),
            ),
        };

        let state = if outcome.status == ScanStatus::Ok {
            ItemState::Done
        } else {
            ItemState::Failed
        };
        debug!(identifier = %item.identifier, state = state.as_str(), "State transition");
        outcome
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Cut `detail` to [`MAX_DETAIL_CHARS`] characters.
pub fn truncate_detail(detail: &str) -> String {
    detail.trim().chars().take(MAX_DETAIL_CHARS).collect()
}
