use crate::store::StoreError;
use thiserror::Error;

/// Errors that end a batch run. Per-item fetch and scan failures are
/// recorded as outcomes instead.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Progress store failure: {0}")]
    Store(#[from] StoreError),
}
