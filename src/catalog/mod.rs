//! Catalog boundary: sources of work items for the progress store.
//!
//! Catalogs only ever upsert. They never touch scan outcomes, so
//! re-importing a catalog while a batch is half done is safe.

mod error;
pub mod wordpress;

pub use error::CatalogError;
pub use wordpress::WordPressCatalog;

use crate::store::{ProgressStore, WorkItem};
use std::path::Path;
use tracing::info;

/// Read a JSON array of work items from `path`.
pub fn read_catalog_file(path: &Path) -> Result<Vec<WorkItem>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut items: Vec<WorkItem> =
        serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for (index, item) in items.iter_mut().enumerate() {
        if item.identifier.trim().is_empty() {
            return Err(CatalogError::InvalidEntry {
                index,
                field: "identifier",
            });
        }
        if item.source_locator.trim().is_empty() {
            return Err(CatalogError::InvalidEntry {
                index,
                field: "source_locator",
            });
        }
        if item.display_name.is_empty() {
            item.display_name = item.identifier.clone();
        }
    }

    Ok(items)
}

/// Import a catalog file into `store`. Returns the number of items upserted.
pub fn import_file(store: &mut ProgressStore, path: &Path) -> Result<usize, CatalogError> {
    let items = read_catalog_file(path)?;
    let count = store.upsert_all(&items)?;
    info!(path = %path.display(), count, "Imported catalog");
    Ok(count)
}
