use super::{Analyzer, AnalyzerError, Language};
use crate::process::{self, ProcessError};
use crate::rules::Finding;
use serde::Deserialize;
use std::process::Command;
use std::time::Duration;

const MAX_ERROR_BYTES: usize = 200;

/// Analyzer backed by an external program.
///
/// The file content is written to the program's stdin; the relative path and
/// language are passed as `PLUGIN_AUDIT_FILE` / `PLUGIN_AUDIT_LANGUAGE`.
/// The program prints either a JSON array of findings or an object with a
/// `findings` array.
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
    timeout_secs: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommandReply {
    Bare(Vec<Finding>),
    Wrapped { findings: Vec<Finding> },
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>, args: &[String]) -> Self {
        Self {
            program: program.into(),
            args: args.to_vec(),
            timeout_secs: 60,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Analyzer for CommandAnalyzer {
    fn analyze(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<Finding>, AnalyzerError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("PLUGIN_AUDIT_FILE", file_path)
            .env("PLUGIN_AUDIT_LANGUAGE", language.as_str());

        let output = process::run_with_timeout(
            &mut cmd,
            Some(content.as_bytes()),
            Duration::from_secs(self.timeout_secs),
        )
        .map_err(|e| match e {
            ProcessError::Timeout { timeout_secs, .. } => AnalyzerError::Timeout {
                file: file_path.to_string(),
                timeout_secs,
            },
            other => AnalyzerError::failed(file_path, other.to_string()),
        })?;

        if !output.success() {
            return Err(AnalyzerError::failed(
                file_path,
                format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    process::truncate_tail(&output.stderr_lossy(), MAX_ERROR_BYTES)
                ),
            ));
        }

        let reply: CommandReply =
            serde_json::from_slice(&output.stdout).map_err(|source| {
                AnalyzerError::InvalidOutput {
                    file: file_path.to_string(),
                    source,
                }
            })?;

        Ok(match reply {
            CommandReply::Bare(findings) | CommandReply::Wrapped { findings } => findings,
        })
    }
}
