use crate::rules::types::{Rule, RuleScope, Severity};
use regex::Regex;

pub fn rules() -> Vec<Rule> {
    vec![secret_001(), secret_002()]
}

fn secret_001() -> Rule {
    Rule {
        id: "SECRET-001",
        languages: &[],
        scope: RuleScope::Line,
        kind: "secrets",
        severity: Severity::Medium,
        patterns: vec![
            Regex::new(
                r#"(?i)['"]?\b\w*(api[_-]?key|secret[_-]?key|client[_-]?secret|password|passwd|auth[_-]?token|access[_-]?token)\b['"]?\s*(=>|=|:)\s*['"][A-Za-z0-9_\-+/=.]{16,}['"]"#,
            )
            .expect("SECRET-001: invalid regex"),
        ],
        exclusions: vec![
            Regex::new(r"(?i)(example|placeholder|your[_-]|xxxx|changeme|dummy|test)")
                .expect("SECRET-001: invalid regex"),
        ],
        message: "Hard-coded credential",
        exploit: "Anyone who downloads the plugin obtains the credential",
        fix: "Load credentials from options or environment configuration, never from source",
        cwe_ids: &["CWE-798"],
    }
}

fn secret_002() -> Rule {
    Rule {
        id: "SECRET-002",
        languages: &[],
        scope: RuleScope::Line,
        kind: "secrets",
        severity: Severity::High,
        patterns: vec![
            Regex::new(r"\bAKIA[0-9A-Z]{16}\b").expect("SECRET-002: invalid regex"),
            Regex::new(r"\bgh[pousr]_[A-Za-z0-9]{36}\b").expect("SECRET-002: invalid regex"),
            Regex::new(r"\bsk_live_[A-Za-z0-9]{24,}\b").expect("SECRET-002: invalid regex"),
            Regex::new(r"-----BEGIN (RSA |EC |OPENSSH )?PRIVATE KEY-----")
                .expect("SECRET-002: invalid regex"),
        ],
        exclusions: vec![],
        message: "Provider access key or private key committed to source",
        exploit: "Leaked provider keys give direct access to the owner's cloud or payment account",
        fix: "Revoke the key and load its replacement from configuration",
        cwe_ids: &["CWE-798"],
    }
}
