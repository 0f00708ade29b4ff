use crate::analyzer::Language;
use crate::rules::types::{Rule, RuleScope, Severity};
use regex::Regex;

pub fn rules() -> Vec<Rule> {
    vec![nonce_001(), idor_001(), info_001()]
}

/// AJAX handlers registered in a file that never verifies a nonce.
fn nonce_001() -> Rule {
    Rule {
        id: "NONCE-001",
        languages: &[Language::Php],
        scope: RuleScope::File,
        kind: "nonce_missing",
        severity: Severity::Medium,
        patterns: vec![
            Regex::new(r#"\badd_action\s*\(\s*['"]wp_ajax_(nopriv_)?\w+['"]"#)
                .expect("NONCE-001: invalid regex"),
            Regex::new(r#"\badd_action\s*\(\s*['"]admin_post_(nopriv_)?\w+['"]"#)
                .expect("NONCE-001: invalid regex"),
        ],
        exclusions: vec![
            Regex::new(r"\b(check_ajax_referer|wp_verify_nonce|check_admin_referer)\s*\(")
                .expect("NONCE-001: invalid regex"),
        ],
        message: "AJAX/admin-post handler without nonce verification",
        exploit: "A logged-in administrator visiting a hostile page triggers the action (CSRF)",
        fix: "Call check_ajax_referer() at the top of the handler and send the nonce from the client",
        cwe_ids: &["CWE-352"],
    }
}

fn idor_001() -> Rule {
    Rule {
        id: "IDOR-001",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "idor",
        severity: Severity::Medium,
        patterns: vec![
            Regex::new(r"\b(wp_delete_post|wp_trash_post|wp_update_post|wp_delete_user|wp_delete_attachment|delete_user_meta|update_user_meta|update_post_meta|delete_post_meta)\s*\([^;]*\$_(GET|POST|REQUEST)")
                .expect("IDOR-001: invalid regex"),
        ],
        exclusions: vec![
            Regex::new(r"\bcurrent_user_can\s*\(").expect("IDOR-001: invalid regex"),
        ],
        message: "Object modified using an identifier taken straight from the request",
        exploit: "Changing the id parameter lets a user modify objects they do not own",
        fix: "Check current_user_can() against the specific object before modifying it",
        cwe_ids: &["CWE-639"],
    }
}

fn info_001() -> Rule {
    Rule {
        id: "INFO-001",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "info_disclosure",
        severity: Severity::Medium,
        patterns: vec![
            Regex::new(r"\bphpinfo\s*\(\s*\)").expect("INFO-001: invalid regex"),
            Regex::new(r#"(?i)ini_set\s*\(\s*['"]display_errors['"]\s*,\s*['"]?(1|on|true)"#)
                .expect("INFO-001: invalid regex"),
            Regex::new(r"\b(var_dump|print_r|var_export)\s*\(\s*\$_(SERVER|ENV|COOKIE)")
                .expect("INFO-001: invalid regex"),
        ],
        exclusions: vec![],
        message: "Server internals exposed to the client",
        exploit: "Configuration details, paths and environment values aid further attacks",
        fix: "Remove debug output from production code paths",
        cwe_ids: &["CWE-200"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(rule: &Rule, line: &str) -> bool {
        rule.patterns.iter().any(|p| p.is_match(line))
            && !rule.exclusions.iter().any(|e| e.is_match(line))
    }

    #[test]
    fn test_nonce_001_detects_ajax_registration() {
        let rule = nonce_001();
        assert_eq!(rule.scope, RuleScope::File);
        assert!(matches(&rule, "add_action('wp_ajax_delete_item', 'my_delete_item');"));
        assert!(matches(&rule, r#"add_action( "wp_ajax_nopriv_vote", 'vote' );"#));
        assert!(!matches(&rule, "add_action('init', 'register_types');"));
    }

    #[test]
    fn test_idor_001_request_id() {
        let rule = idor_001();
        assert!(matches(&rule, "wp_delete_post( intval( $_POST['id'] ), true );"));
        assert!(!matches(&rule, "wp_delete_post( $id, true );"));
    }

    #[test]
    fn test_info_001_phpinfo() {
        let rule = info_001();
        assert!(matches(&rule, "phpinfo();"));
        assert!(matches(&rule, "ini_set('display_errors', 1);"));
        assert!(matches(&rule, "print_r($_SERVER);"));
        assert!(!matches(&rule, "print_r($options, true);"));
    }
}
