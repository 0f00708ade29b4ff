use crate::analyzer::Language;
use crate::rules::types::{Rule, RuleScope, Severity};
use regex::Regex;

pub fn rules() -> Vec<Rule> {
    vec![xss_001(), xss_002()]
}

fn xss_001() -> Rule {
    Rule {
        id: "XSS-001",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "xss",
        severity: Severity::High,
        patterns: vec![
            Regex::new(r"\b(echo|print|printf)\b[^;]*\$_(GET|POST|REQUEST|COOKIE|SERVER)")
                .expect("XSS-001: invalid regex"),
            Regex::new(r"<\?=\s*\$_(GET|POST|REQUEST|COOKIE)").expect("XSS-001: invalid regex"),
        ],
        exclusions: vec![
            Regex::new(
                r"\b(esc_html|esc_attr|esc_url|esc_js|esc_textarea|wp_kses|wp_kses_post|htmlspecialchars|htmlentities|intval|absint|sanitize_\w+)\s*\(",
            )
            .expect("XSS-001: invalid regex"),
        ],
        message: "Request data echoed without escaping",
        exploit: "A crafted link makes the page render attacker-supplied script",
        fix: "Escape on output with esc_html(), esc_attr() or esc_url()",
        cwe_ids: &["CWE-79"],
    }
}

fn xss_002() -> Rule {
    Rule {
        id: "XSS-002",
        languages: &[Language::Js],
        scope: RuleScope::Line,
        kind: "xss",
        severity: Severity::Medium,
        patterns: vec![
            Regex::new(r"\.(innerHTML|outerHTML)\s*\+?=\s*[a-zA-Z_$(]").expect("XSS-002: invalid regex"),
            Regex::new(r"\bdocument\.write(ln)?\s*\(").expect("XSS-002: invalid regex"),
            Regex::new(r"\.insertAdjacentHTML\s*\(").expect("XSS-002: invalid regex"),
        ],
        exclusions: vec![
            Regex::new(r"(DOMPurify\.sanitize|escapeHtml|_\.escape)\s*\(")
                .expect("XSS-002: invalid regex"),
        ],
        message: "Dynamic value written into the DOM as HTML",
        exploit: "Markup built from untrusted data executes injected script in the browser",
        fix: "Assign textContent instead, or sanitize with DOMPurify before inserting HTML",
        cwe_ids: &["CWE-79"],
    }
}
