use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog entry {index} has an empty {field}")]
    InvalidEntry { index: usize, field: &'static str },

    #[error("Catalog request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Unexpected catalog response from {url}: {message}")]
    Response { url: String, message: String },

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}
