//! Source acquisition across transports.
//!
//! [`VcsFetcher`] owns the scratch-directory lifecycle: it acquires a fresh
//! directory, hands it to exactly one [`SourceFetcher`] per
//! [`TransportKind`], and removes the directory again if that fetcher fails.
//! Transport implementations only report where the scan root is.

mod archive;
mod error;
mod git;
mod svn;

pub use archive::{ArchiveFetcher, archive_url};
pub use error::FetchError;
pub use git::GitFetcher;
pub use svn::{SvnFetcher, trunk_locator};

use crate::config::FetchConfig;
use crate::process::{self, ProcessError};
use crate::store::{TransportKind, WorkItem};
use crate::workdir::{ScopedDir, WorkingDirectory};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A materialized source tree and the directory that owns it.
#[derive(Debug)]
pub struct FetchResult {
    scan_root: PathBuf,
    dir: ScopedDir,
}

impl FetchResult {
    pub fn new(scan_root: PathBuf, dir: ScopedDir) -> Self {
        Self { scan_root, dir }
    }

    /// Directory containing the normalized source tree.
    pub fn scan_root(&self) -> &Path {
        &self.scan_root
    }

    /// Top-level directory to remove once the item is done.
    pub fn cleanup_root(&self) -> &Path {
        self.dir.path()
    }

    /// Remove everything this fetch created.
    pub fn release(self) -> std::io::Result<()> {
        self.dir.release()
    }
}

/// One transport's way of filling `dest` with source. Returns the scan root,
/// which must be `dest` or a directory below it.
pub trait SourceFetcher {
    fn fetch_into(
        &self,
        identifier: &str,
        source_locator: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, FetchError>;
}

/// Materializes a work item's source. Implemented by [`VcsFetcher`]; tests
/// substitute scripted fetchers.
pub trait Fetcher {
    fn fetch(&self, item: &WorkItem) -> Result<FetchResult, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, item: &WorkItem) -> Result<FetchResult, FetchError> {
        (**self).fetch(item)
    }
}

/// Dispatches to the transport implementation for each [`TransportKind`].
pub struct VcsFetcher {
    workdir: WorkingDirectory,
    svn: SvnFetcher,
    git: GitFetcher,
    archive: ArchiveFetcher,
    clone_timeout: Duration,
    download_timeout: Duration,
}

impl VcsFetcher {
    pub fn from_config(config: &FetchConfig) -> Self {
        let workdir = config
            .work_dir
            .as_ref()
            .map(WorkingDirectory::new)
            .unwrap_or_default();

        Self {
            workdir,
            svn: SvnFetcher::new(&config.svn_program, config.max_stderr_bytes),
            git: GitFetcher::new(&config.git_program, config.max_stderr_bytes),
            archive: ArchiveFetcher::new(&config.archive_url_template),
            clone_timeout: Duration::from_secs(config.clone_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    /// Default wall-clock limit for a transport.
    pub fn default_timeout(&self, kind: TransportKind) -> Duration {
        match kind {
            TransportKind::Svn | TransportKind::GitHosted => self.clone_timeout,
            TransportKind::Archive | TransportKind::Unknown => self.download_timeout,
        }
    }

    fn transport(&self, kind: TransportKind) -> &dyn SourceFetcher {
        match kind {
            TransportKind::Svn => &self.svn,
            TransportKind::GitHosted => &self.git,
            TransportKind::Archive | TransportKind::Unknown => &self.archive,
        }
    }

    /// Fetch into a fresh directory. On failure the directory is removed
    /// before the error is returned.
    pub fn fetch_with_timeout(
        &self,
        identifier: &str,
        source_locator: &str,
        kind: TransportKind,
        timeout: Duration,
    ) -> Result<FetchResult, FetchError> {
        let dir = self
            .workdir
            .acquire(identifier)
            .map_err(|e| FetchError::io(identifier, self.workdir.base(), e))?;

        debug!(
            identifier,
            transport = %kind,
            locator = source_locator,
            dest = %dir.path().display(),
            "Fetching source"
        );

        match self
            .transport(kind)
            .fetch_into(identifier, source_locator, dir.path(), timeout)
        {
            Ok(scan_root) => {
                info!(identifier, transport = %kind, scan_root = %scan_root.display(), "Fetched source");
                Ok(FetchResult::new(scan_root, dir))
            }
            Err(err) => {
                let path = dir.path().to_path_buf();
                if let Err(e) = dir.release() {
                    warn!(identifier, path = %path.display(), error = %e, "Failed to remove partial fetch");
                }
                Err(err)
            }
        }
    }
}

impl Fetcher for VcsFetcher {
    fn fetch(&self, item: &WorkItem) -> Result<FetchResult, FetchError> {
        self.fetch_with_timeout(
            &item.identifier,
            &item.source_locator,
            item.transport_kind,
            self.default_timeout(item.transport_kind),
        )
    }
}

/// Run a transport subprocess, turning timeouts and non-zero exits into
/// [`FetchError`]s carrying truncated stderr.
pub(crate) fn run_transport(
    identifier: &str,
    cmd: &mut Command,
    timeout: Duration,
    max_stderr_bytes: usize,
) -> Result<(), FetchError> {
    let program = cmd.get_program().to_string_lossy().into_owned();

    let output = process::run_with_timeout(cmd, None, timeout).map_err(|e| match e {
        ProcessError::Timeout {
            timeout_secs,
            stderr,
            ..
        } => FetchError::Timeout {
            identifier: identifier.to_string(),
            program: program.clone(),
            timeout_secs,
            stderr: process::truncate_tail(&stderr, max_stderr_bytes),
        },
        ProcessError::Spawn { source, .. } | ProcessError::Wait { source, .. } => {
            FetchError::Spawn {
                identifier: identifier.to_string(),
                program: program.clone(),
                source,
            }
        }
    })?;

    if !output.success() {
        return Err(FetchError::Exit {
            identifier: identifier.to_string(),
            program,
            status: output.status.to_string(),
            stderr: process::truncate_tail(&output.stderr_lossy(), max_stderr_bytes),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(base: &Path) -> FetchConfig {
        FetchConfig {
            work_dir: Some(base.to_path_buf()),
            ..FetchConfig::default()
        }
    }

    fn entry_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_default_timeouts() {
        let fetcher = VcsFetcher::from_config(&FetchConfig::default());
        assert_eq!(
            fetcher.default_timeout(TransportKind::Svn),
            Duration::from_secs(300)
        );
        assert_eq!(
            fetcher.default_timeout(TransportKind::GitHosted),
            Duration::from_secs(300)
        );
        assert_eq!(
            fetcher.default_timeout(TransportKind::Archive),
            Duration::from_secs(120)
        );
        assert_eq!(
            fetcher.default_timeout(TransportKind::Unknown),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_failed_fetch_removes_directory() {
        let base = TempDir::new().unwrap();
        let fetcher = VcsFetcher::from_config(&FetchConfig {
            archive_url_template: format!(
                "file://{}/missing/{{identifier}}.zip",
                base.path().display()
            ),
            ..config(&base.path().join("work"))
        });

        let err = fetcher
            .fetch_with_timeout(
                "ghost",
                "ghost",
                TransportKind::Archive,
                Duration::from_secs(5),
            )
            .unwrap_err();
        assert_eq!(err.reason(), "download");
        assert_eq!(entry_count(&base.path().join("work")), 0);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let base = TempDir::new().unwrap();
        let fetcher = VcsFetcher::from_config(&FetchConfig {
            git_program: "definitely-not-git-7731".to_string(),
            ..config(base.path())
        });
        let item = WorkItem::new(
            "plugin",
            "Plugin",
            "https://github.com/owner/plugin",
            TransportKind::GitHosted,
        );

        let err = fetcher.fetch(&item).unwrap_err();
        assert_eq!(err.reason(), "spawn");
        assert_eq!(entry_count(base.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_transport_timeout_and_exit() {
        let err = run_transport(
            "slow",
            Command::new("sh").args(["-c", "echo checking out >&2; exec sleep 30"]),
            Duration::from_millis(300),
            4096,
        )
        .unwrap_err();
        assert_eq!(err.reason(), "timeout");

        let err = run_transport(
            "broken",
            Command::new("sh").args(["-c", "echo 'svn: E170000: URL does not exist' >&2; exit 1"]),
            Duration::from_secs(10),
            16,
        )
        .unwrap_err();
        assert_eq!(err.reason(), "exit");
        let detail = err.exit_detail().unwrap();
        assert!(detail.starts_with("..."));
        assert!(detail.ends_with("does not exist"));
    }
}
