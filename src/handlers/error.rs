//! Handler-specific error types.

use thiserror::Error;

/// Fatal errors of a CLI command. All map to exit code 2.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    #[error(transparent)]
    Batch(#[from] crate::batch::BatchError),

    #[error("Scan failed: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error(transparent)]
    Catalog(#[from] crate::catalog::CatalogError),

    #[error(transparent)]
    Service(#[from] crate::service::ServiceError),

    #[error(transparent)]
    Benchmark(#[from] crate::benchmark::BenchmarkError),
}
