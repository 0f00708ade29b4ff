use super::{FetchError, SourceFetcher, run_transport};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Shallow clone from a hosted git service.
pub struct GitFetcher {
    program: String,
    max_stderr_bytes: usize,
}

impl GitFetcher {
    pub fn new(program: impl Into<String>, max_stderr_bytes: usize) -> Self {
        Self {
            program: program.into(),
            max_stderr_bytes,
        }
    }

    fn clone_command(&self, url: &str, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.program);

        // No templates, hooks or credential prompts from the cloned repository
        cmd.env("GIT_TEMPLATE_DIR", "")
            .env("GIT_TERMINAL_PROMPT", "0")
            .args([
                "clone",
                "--depth",
                "1",
                "--single-branch",
                "--no-tags",
                "--quiet",
                "-c",
                "core.hooksPath=/dev/null",
                "-c",
                "advice.detachedHead=false",
            ])
            .arg(url)
            .arg(dest);
        cmd
    }
}

impl SourceFetcher for GitFetcher {
    fn fetch_into(
        &self,
        identifier: &str,
        source_locator: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, FetchError> {
        let mut cmd = self.clone_command(source_locator.trim(), dest);
        run_transport(identifier, &mut cmd, timeout, self.max_stderr_bytes)?;
        Ok(dest.to_path_buf())
    }
}
