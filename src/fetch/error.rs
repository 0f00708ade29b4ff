use std::path::PathBuf;
use thiserror::Error;

/// Failure to materialize a work item's source tree.
///
/// Captured standard error is already truncated when stored here.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{program} timed out after {timeout_secs}s fetching {identifier}")]
    Timeout {
        identifier: String,
        program: String,
        timeout_secs: u64,
        stderr: String,
    },

    #[error("{program} exited with {status} fetching {identifier}: {stderr}")]
    Exit {
        identifier: String,
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to start {program} for {identifier}: {source}")]
    Spawn {
        identifier: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Download of {url} failed: {message}")]
    Download {
        identifier: String,
        url: String,
        message: String,
    },

    #[error("Failed to extract archive for {identifier}")]
    Extract {
        identifier: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Unusable source layout for {identifier}: {message}")]
    Layout { identifier: String, message: String },

    #[error("I/O error fetching {identifier} at {path}: {source}")]
    Io {
        identifier: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Short stable tag for the failure class.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "timeout",
            FetchError::Exit { .. } => "exit",
            FetchError::Spawn { .. } => "spawn",
            FetchError::Download { .. } => "download",
            FetchError::Extract { .. } => "extract",
            FetchError::Layout { .. } => "layout",
            FetchError::Io { .. } => "io",
        }
    }

    /// Captured subprocess error output, if any.
    pub fn exit_detail(&self) -> Option<&str> {
        match self {
            FetchError::Timeout { stderr, .. } | FetchError::Exit { stderr, .. }
                if !stderr.is_empty() =>
            {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }

    pub(crate) fn io(identifier: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            identifier: identifier.to_string(),
            path: path.into(),
            source,
        }
    }
}
