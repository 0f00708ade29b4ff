use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create store directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open store {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Outcome recorded against an identifier that was never cataloged.
    #[error("Work item not found: {0}")]
    NotFound(String),

    #[error("Refusing to record a pending outcome for {0}")]
    PendingOutcome(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
