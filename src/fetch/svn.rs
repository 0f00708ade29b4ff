use super::{FetchError, SourceFetcher, run_transport};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Subversion checkout of a plugin's trunk.
///
/// The checkout always targets the `trunk` branch itself, so the checkout
/// directory is the scan root.
pub struct SvnFetcher {
    program: String,
    max_stderr_bytes: usize,
}

impl SvnFetcher {
    pub fn new(program: impl Into<String>, max_stderr_bytes: usize) -> Self {
        Self {
            program: program.into(),
            max_stderr_bytes,
        }
    }
}

impl SourceFetcher for SvnFetcher {
    fn fetch_into(
        &self,
        identifier: &str,
        source_locator: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, FetchError> {
        let url = trunk_locator(source_locator);

        let mut cmd = Command::new(&self.program);
        cmd.args(["checkout", "--non-interactive", "--quiet", "--depth", "infinity"])
            .arg(&url)
            .arg(dest)
            .env("LC_ALL", "C");

        run_transport(identifier, &mut cmd, timeout, self.max_stderr_bytes)?;
        Ok(dest.to_path_buf())
    }
}

/// Point a registry root locator (`https://plugins.svn.wordpress.org/<slug>`)
/// at its `trunk`. Locators that already name trunk, a tag or a branch, and
/// locators that are not registry roots, are returned unchanged.
pub fn trunk_locator(locator: &str) -> String {
    let trimmed = locator.trim().trim_end_matches('/');

    let names_branch = trimmed.ends_with("/trunk")
        || trimmed.contains("/trunk/")
        || trimmed.contains("/tags/")
        || trimmed.contains("/branches/");
    if names_branch || !is_registry_root(trimmed) {
        return trimmed.to_string();
    }

    format!("{trimmed}/trunk")
}

/// A registry root is a single path segment below an `svn.` host.
fn is_registry_root(locator: &str) -> bool {
    let Some((_, rest)) = locator.split_once("://") else {
        return false;
    };
    let mut parts = rest.split('/');
    let host = parts.next().unwrap_or_default();
    let segments: Vec<&str> = parts.filter(|s| !s.is_empty()).collect();

    host.split('.').any(|label| label == "svn") && segments.len() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trunk_appended_to_registry_root() {
        assert_eq!(
            trunk_locator("https://plugins.svn.wordpress.org/akismet"),
            "https://plugins.svn.wordpress.org/akismet/trunk"
        );
        assert_eq!(
            trunk_locator("https://plugins.svn.wordpress.org/akismet/"),
            "https://plugins.svn.wordpress.org/akismet/trunk"
        );
    }

    #[test]
    fn test_existing_branch_left_alone() {
        assert_eq!(
            trunk_locator("https://plugins.svn.wordpress.org/akismet/trunk"),
            "https://plugins.svn.wordpress.org/akismet/trunk"
        );
        assert_eq!(
            trunk_locator("https://plugins.svn.wordpress.org/akismet/tags/5.3"),
            "https://plugins.svn.wordpress.org/akismet/tags/5.3"
        );
    }

    #[test]
    fn test_non_registry_locator_left_alone() {
        assert_eq!(
            trunk_locator("svn://svn.example.org/project/src"),
            "svn://svn.example.org/project/src"
        );
        assert_eq!(
            trunk_locator("https://example.org/repo"),
            "https://example.org/repo"
        );
        assert_eq!(trunk_locator("akismet"), "akismet");
    }

    #[cfg(unix)]
    #[test]
    fn test_checkout_failure_reports_exit() {
        let dest = tempfile::TempDir::new().unwrap();
        let fetcher = SvnFetcher::new("false", 4096);
        let err = fetcher
            .fetch_into(
                "akismet",
                "https://plugins.svn.wordpress.org/akismet",
                dest.path(),
                Duration::from_secs(10),
            )
            .unwrap_err();
        assert_eq!(err.reason(), "exit");
    }
}
