//! Configuration for plugin-audit.
//!
//! ## Layers
//! - `types`: Configuration type definitions
//! - `loading`: File discovery and parsing
//!
//! Command-line flags are applied on top by the handlers.

mod error;
mod loading;
mod types;

pub use error::ConfigError;
pub use types::{
    AnalyzerConfig, BatchConfig, Config, FetchConfig, ScanConfig, ServiceConfig, StoreConfig,
};
