//! WordPress-specific post-processing of analyzer output.

use super::{Analyzer, AnalyzerError, Language};
use crate::rules::{Finding, Severity};

/// OWASP category used when neither the analyzer nor the map supplies one.
pub const DEFAULT_OWASP: &str = "A09:2021-Security Misconfiguration";

/// Finding types that indicate broken access control in a WordPress plugin
/// and are always reported at least as `high`.
const ACCESS_CONTROL_KINDS: &[&str] = &["nonce_missing", "idor"];

pub fn owasp_category(kind: &str) -> Option<&'static str> {
    match kind {
        "sqli" | "rce" => Some("A03:2021-Injection"),
        "ssrf" => Some("A10:2021-SSRF"),
        "xss" => Some("A07:2021-XSS"),
        "secrets" => Some("A09:2021-Security Misconfiguration"),
        "path_traversal" => Some("A05:2021-Security Misconfiguration"),
        "nonce_missing" | "idor" | "info_disclosure" => Some("A01:2021-Broken Access Control"),
        _ => None,
    }
}

/// Apply the WordPress severity and OWASP rules to one finding.
pub fn enrich(mut finding: Finding) -> Finding {
    if ACCESS_CONTROL_KINDS.contains(&finding.kind.as_str()) && finding.severity < Severity::High
    {
        finding.severity = Severity::High;
    }

    match owasp_category(&finding.kind) {
        Some(category) => finding.owasp = Some(category.to_string()),
        None if finding.owasp.as_deref().is_none_or(str::is_empty) => {
            finding.owasp = Some(DEFAULT_OWASP.to_string());
        }
        None => {}
    }

    finding
}

/// Decorator that runs the WordPress enrichment over another analyzer's output.
pub struct WordPressAnalyzer<A> {
    inner: A,
}

impl<A: Analyzer> WordPressAnalyzer<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

impl<A: Analyzer> Analyzer for WordPressAnalyzer<A> {
    fn analyze(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<Finding>, AnalyzerError> {
        let findings = self.inner.analyze(content, file_path, language)?;
        Ok(findings.into_iter().map(enrich).collect())
    }
}
