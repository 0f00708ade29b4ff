use super::{FetchError, SourceFetcher};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use zip::ZipArchive;

const DOWNLOAD_NAME: &str = ".plugin-audit-download.zip";
const USER_AGENT: &str = concat!("plugin-audit/", env!("CARGO_PKG_VERSION"));

/// Zip download and extraction. Also used for items of unknown transport.
pub struct ArchiveFetcher {
    url_template: String,
}

impl ArchiveFetcher {
    /// `url_template` has `{identifier}` replaced by the item's identifier.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
        }
    }

    fn download(
        &self,
        identifier: &str,
        url: &str,
        target: &Path,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let download_err = |message: String| FetchError::Download {
            identifier: identifier.to_string(),
            url: url.to_string(),
            message,
        };

        if let Some(local) = url.strip_prefix("file://") {
            std::fs::copy(local, target).map_err(|e| download_err(e.to_string()))?;
            return Ok(());
        }

        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        let response = agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => download_err(format!("HTTP {code}")),
                ureq::Error::Transport(t) if is_timeout(&t) => FetchError::Timeout {
                    identifier: identifier.to_string(),
                    program: "download".to_string(),
                    timeout_secs: timeout.as_secs(),
                    stderr: String::new(),
                },
                ureq::Error::Transport(t) => download_err(t.to_string()),
            })?;

        let mut file = File::create(target).map_err(|e| FetchError::io(identifier, target, e))?;
        io::copy(&mut response.into_reader(), &mut file).map_err(|e| {
            if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
                FetchError::Timeout {
                    identifier: identifier.to_string(),
                    program: "download".to_string(),
                    timeout_secs: timeout.as_secs(),
                    stderr: String::new(),
                }
            } else {
                download_err(e.to_string())
            }
        })?;
        Ok(())
    }
}

impl SourceFetcher for ArchiveFetcher {
    fn fetch_into(
        &self,
        identifier: &str,
        source_locator: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, FetchError> {
        let url = archive_url(&self.url_template, identifier, source_locator);
        let download = dest.join(DOWNLOAD_NAME);

        debug!(identifier, url = %url, "Downloading archive");
        self.download(identifier, &url, &download, timeout)?;

        let file = File::open(&download).map_err(|e| FetchError::io(identifier, &download, e))?;
        let mut archive = ZipArchive::new(file).map_err(|source| FetchError::Extract {
            identifier: identifier.to_string(),
            source,
        })?;
        if archive.is_empty() {
            return Err(FetchError::Layout {
                identifier: identifier.to_string(),
                message: "archive contains no entries".to_string(),
            });
        }
        archive.extract(dest).map_err(|source| FetchError::Extract {
            identifier: identifier.to_string(),
            source,
        })?;
        drop(archive);

        std::fs::remove_file(&download).map_err(|e| FetchError::io(identifier, &download, e))?;

        resolve_scan_root(identifier, dest)
    }
}

/// The locator itself when it is already an archive URL, otherwise the
/// template expanded with `identifier`.
pub fn archive_url(template: &str, identifier: &str, source_locator: &str) -> String {
    let locator = source_locator.trim();
    let is_url = ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| locator.starts_with(scheme));

    if is_url && locator.to_ascii_lowercase().ends_with(".zip") {
        locator.to_string()
    } else {
        template.replace("{identifier}", identifier)
    }
}

/// A single extracted top-level directory becomes the scan root; anything
/// else falls back to `dest` itself.
fn resolve_scan_root(identifier: &str, dest: &Path) -> Result<PathBuf, FetchError> {
    let mut dirs = Vec::new();
    let mut others = 0usize;

    for entry in std::fs::read_dir(dest).map_err(|e| FetchError::io(identifier, dest, e))? {
        let entry = entry.map_err(|e| FetchError::io(identifier, dest, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| FetchError::io(identifier, entry.path(), e))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        } else {
            others += 1;
        }
    }

    match (dirs.len(), others) {
        (0, 0) => Err(FetchError::Layout {
            identifier: identifier.to_string(),
            message: "no files found after extraction".to_string(),
        }),
        (1, 0) => Ok(dirs.remove(0)),
        _ => {
            debug!(identifier, dirs = dirs.len(), files = others, "Ambiguous archive layout, scanning extraction root");
            Ok(dest.to_path_buf())
        }
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>()
            && matches!(io_err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
        {
            return true;
        }
        source = err.source();
    }
    false
}
