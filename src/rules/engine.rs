use crate::analyzer::{Analyzer, AnalyzerError, Language};
use crate::rules::builtin;
use crate::rules::types::{Finding, Rule, RuleScope};
use tracing::trace;

const MAX_SNIPPET_CHARS: usize = 200;

/// Regex rule engine over the built-in rule tables.
pub struct PatternAnalyzer {
    rules: &'static [Rule],
    skip_comments: bool,
}

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self {
            rules: builtin::all_rules(),
            skip_comments: true,
        }
    }

    pub fn with_skip_comments(mut self, skip: bool) -> Self {
        self.skip_comments = skip;
        self
    }

    /// Get a rule by ID
    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn check_content(&self, content: &str, file_path: &str, language: Language) -> Vec<Finding> {
        let rules: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.applies_to(language))
            .collect();

        trace!(
            file = file_path,
            language = %language,
            lines = content.lines().count(),
            rules = rules.len(),
            "Checking content against rules"
        );

        let mut findings = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            if self.skip_comments && Self::is_comment_line(line) {
                continue;
            }

            for rule in rules.iter().filter(|r| r.scope == RuleScope::Line) {
                if let Some(finding) = Self::check_line(rule, line, file_path, line_num + 1) {
                    findings.push(finding);
                }
            }
        }

        for rule in rules.iter().filter(|r| r.scope == RuleScope::File) {
            if let Some(finding) = self.check_file(rule, content, file_path) {
                findings.push(finding);
            }
        }

        findings
    }

    /// Detects comment lines for the languages plugins are written in:
    /// `#` and `//` line comments plus the body lines of `/* ... */` blocks.
    pub fn is_comment_line(line: &str) -> bool {
        let trimmed = line.trim_start();
        trimmed.starts_with("//")
            || trimmed.starts_with('#')
            || trimmed.starts_with("/*")
            || trimmed.starts_with("* ")
            || trimmed == "*"
            || trimmed.starts_with("*/")
    }

    fn check_line(rule: &Rule, line: &str, file_path: &str, line_num: usize) -> Option<Finding> {
        let matched = rule.patterns.iter().any(|p| p.is_match(line));
        if !matched {
            return None;
        }

        let excluded = rule.exclusions.iter().any(|e| e.is_match(line));
        if excluded {
            return None;
        }

        Some(Finding::new(rule, file_path, line_num, &snippet(line)))
    }

    fn check_file(&self, rule: &Rule, content: &str, file_path: &str) -> Option<Finding> {
        if rule.exclusions.iter().any(|e| e.is_match(content)) {
            return None;
        }

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !(self.skip_comments && Self::is_comment_line(line)))
            .find(|(_, line)| rule.patterns.iter().any(|p| p.is_match(line)))
            .map(|(idx, line)| Finding::new(rule, file_path, idx + 1, &snippet(line)))
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for PatternAnalyzer {
    fn analyze(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<Finding>, AnalyzerError> {
        Ok(self.check_content(content, file_path, language))
    }
}

fn snippet(line: &str) -> String {
    line.trim().chars().take(MAX_SNIPPET_CHARS).collect()
}
