//! `catalog` commands.

use super::{HandlerError, HandlerResult, open_store};
use crate::catalog::{self, WordPressCatalog};
use crate::config::Config;
use std::path::Path;
use tracing::info;

pub fn handle_catalog_import(config: &Config, file: &Path) -> Result<HandlerResult, HandlerError> {
    let mut store = open_store(config)?;
    let count = catalog::import_file(&mut store, file)?;
    println!("Imported {count} item(s) from {}", file.display());
    Ok(HandlerResult::Success)
}

pub fn handle_catalog_wordpress(
    config: &Config,
    page: u32,
    per_page: u32,
) -> Result<HandlerResult, HandlerError> {
    let mut store = open_store(config)?;
    let items = WordPressCatalog::new().fetch_page(page, per_page)?;
    let count = store.upsert_all(&items)?;
    info!(page, per_page, count, "Imported plugin directory page");
    println!("page={page}, per_page={per_page}: saved {count} plugin(s)");
    Ok(HandlerResult::Success)
}
