//! Per-attempt scratch directories.
//!
//! Every fetch gets a fresh directory under the configured base. The
//! [`ScopedDir`] guard removes it when released explicitly or, failing that,
//! when dropped, so a panic or early return never leaves a checkout behind.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const MAX_PREFIX_CHARS: usize = 64;

/// Allocates unique scratch directories under one base directory.
#[derive(Debug, Clone)]
pub struct WorkingDirectory {
    base: PathBuf,
}

impl WorkingDirectory {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Scratch directories under the system temp dir.
    pub fn system_temp() -> Self {
        Self::new(std::env::temp_dir().join("plugin-audit"))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Create a fresh, collision-free directory named after `prefix`.
    pub fn acquire(&self, prefix: &str) -> io::Result<ScopedDir> {
        std::fs::create_dir_all(&self.base)?;

        let path = self
            .base
            .join(format!("{}-{}", sanitize_prefix(prefix), Uuid::new_v4().simple()));
        // create_dir (not create_dir_all) so an existing path is an error
        std::fs::create_dir(&path)?;
        debug!(path = %path.display(), "Acquired working directory");

        Ok(ScopedDir {
            path,
            released: false,
        })
    }

    /// Recursively remove `path`. Removing a path that no longer exists is
    /// not an error.
    pub fn release(path: &Path) -> io::Result<()> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Released working directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Default for WorkingDirectory {
    fn default() -> Self {
        Self::system_temp()
    }
}

/// Guard over one acquired directory.
#[derive(Debug)]
pub struct ScopedDir {
    path: PathBuf,
    released: bool,
}

impl ScopedDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now and report any failure.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        WorkingDirectory::release(&self.path)
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = WorkingDirectory::release(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove working directory");
        }
    }
}

fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_PREFIX_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "item".to_string()
    } else {
        cleaned
    }
}
