use thiserror::Error;

/// Per-file analyzer failure. Never fatal to a repository scan.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Analyzer failed for {file}: {message}")]
    Failed { file: String, message: String },

    #[error("Analyzer timed out for {file} after {timeout_secs}s")]
    Timeout { file: String, timeout_secs: u64 },

    #[error("Analyzer returned invalid output for {file}")]
    InvalidOutput {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AnalyzerError {
    pub fn failed(file: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            file: file.to_string(),
            message: message.into(),
        }
    }
}
