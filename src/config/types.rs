//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for plugin-audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub fetch: FetchConfig,
    pub scan: ScanConfig,
    pub analyzer: AnalyzerConfig,
    pub batch: BatchConfig,
    pub service: ServiceConfig,
}

/// Progress store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("db/scans.sqlite"),
        }
    }
}

/// Source acquisition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Base directory for per-item scratch directories. Defaults to the
    /// system temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// Wall-clock limit for svn checkout and git clone.
    pub clone_timeout_secs: u64,
    /// Wall-clock limit for archive downloads.
    pub download_timeout_secs: u64,
    /// Archive URL; `{identifier}` is replaced with the item identifier.
    pub archive_url_template: String,
    pub svn_program: String,
    pub git_program: String,
    /// Bytes of subprocess stderr kept in fetch errors.
    pub max_stderr_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            clone_timeout_secs: 300,
            download_timeout_secs: 120,
            archive_url_template: "https://downloads.wordpress.org/plugin/{identifier}.zip"
                .to_string(),
            svn_program: "svn".to_string(),
            git_program: "git".to_string(),
            max_stderr_bytes: 4096,
        }
    }
}

/// File selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Files analyzed per repository.
    pub max_files: usize,
    /// Per-file size ceiling in bytes (0 = unlimited).
    pub max_file_size: u64,
    /// Scannable file extensions, without the dot.
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: 30,
            max_file_size: 1024 * 1024,
            extensions: vec!["php".to_string(), "js".to_string(), "py".to_string()],
        }
    }
}

/// Content analyzer selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// External analyzer argv. Unset means the built-in pattern rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Per-file limit for the external analyzer.
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Items processed per batch run.
    pub limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen address of the HTTP service.
    pub listen: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}
