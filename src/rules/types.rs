use crate::analyzer::Language;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Finding type used when an analyzer leaves the category blank.
pub const UNKNOWN_KIND: &str = "unknown";

/// Granularity at which a rule is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Patterns and exclusions are matched line by line.
    Line,
    /// The first pattern match is reported once per file, unless an
    /// exclusion matches anywhere in the file.
    File,
}

/// Static description of one built-in pattern rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: &'static str,
    /// Languages the rule applies to. Empty means every language.
    pub languages: &'static [Language],
    pub scope: RuleScope,
    /// Finding category tag emitted for matches (e.g. "rce", "sqli").
    pub kind: &'static str,
    pub severity: Severity,
    pub patterns: Vec<regex::Regex>,
    pub exclusions: Vec<regex::Regex>,
    pub message: &'static str,
    pub exploit: &'static str,
    pub fix: &'static str,
    pub cwe_ids: &'static [&'static str],
}

/// One issue reported by a content analyzer.
///
/// Every field except the location and category is optional on the wire so
/// that findings coming from external analyzers can be deserialized leniently
/// and then repaired by [`Finding::normalize`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Finding {
    /// Path relative to the scan root.
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: usize,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cwe: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owasp: Option<String>,
}

impl Rule {
    pub fn applies_to(&self, language: Language) -> bool {
        self.languages.is_empty() || self.languages.contains(&language)
    }
}

impl Finding {
    pub fn new(rule: &Rule, file: &str, line: usize, snippet: &str) -> Self {
        Self {
            file: file.to_string(),
            line,
            kind: rule.kind.to_string(),
            severity: rule.severity,
            description: rule.message.to_string(),
            snippet: Some(snippet.trim().to_string()),
            exploit: Some(rule.exploit.to_string()),
            fix: Some(rule.fix.to_string()),
            cwe: rule.cwe_ids.iter().map(|s| s.to_string()).collect(),
            owasp: None,
        }
    }

    /// Fill in the fields every downstream consumer relies on: a non-empty
    /// file, a 1-based line and a non-empty type.
    pub fn normalize(mut self, fallback_file: &str) -> Self {
        if self.file.trim().is_empty() {
            self.file = fallback_file.to_string();
        }
        if self.line == 0 {
            self.line = 1;
        }
        if self.kind.trim().is_empty() {
            self.kind = UNKNOWN_KIND.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub passed: bool,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary.passed = summary.critical == 0 && summary.high == 0;
        summary
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

/// Aggregated result of scanning one repository, handed to reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub version: String,
    pub scanned_at: String,
    pub target: String,
    pub summary: Summary,
    pub findings: Vec<Finding>,
}

impl ScanResult {
    pub fn new(target: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            scanned_at: chrono::Utc::now().to_rfc3339(),
            target: target.into(),
            summary: Summary::from_findings(&findings),
            findings,
        }
    }
}
