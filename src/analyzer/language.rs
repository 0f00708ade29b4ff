use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source language tag handed to analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Php,
    Js,
    Python,
}

impl Language {
    /// Infer the language from a file extension. Unrecognized extensions
    /// fall back to PHP, the language plugin catalogs are written in.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("js") | Some("mjs") | Some("cjs") | Some("jsx") => Language::Js,
            Some("py") => Language::Python,
            _ => Language::Php,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Php => "php",
            Language::Js => "js",
            Language::Python => "python",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
