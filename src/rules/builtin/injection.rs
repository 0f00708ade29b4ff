use crate::analyzer::Language;
use crate::rules::types::{Rule, RuleScope, Severity};
use regex::Regex;

pub fn rules() -> Vec<Rule> {
    vec![
        rce_001(),
        rce_002(),
        rce_003(),
        rce_004(),
        sqli_001(),
        sqli_002(),
        path_001(),
        ssrf_001(),
    ]
}

fn rce_001() -> Rule {
    Rule {
        id: "RCE-001",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "rce",
        severity: Severity::High,
        patterns: vec![
            Regex::new(r"\b(shell_exec|exec|system|passthru|popen|proc_open|pcntl_exec)\s*\(\s*\$")
                .expect("RCE-001: invalid regex"),
        ],
        exclusions: vec![
            Regex::new(r"escapeshellarg\s*\(").expect("RCE-001: invalid regex"),
            Regex::new(r"->\s*(exec|system)\s*\(").expect("RCE-001: invalid regex"),
        ],
        message: "OS command executed with a variable argument",
        exploit: "An attacker who controls the variable can run arbitrary commands on the server",
        fix: "Avoid shell execution or wrap every argument in escapeshellarg()",
        cwe_ids: &["CWE-78"],
    }
}

fn rce_002() -> Rule {
    Rule {
        id: "RCE-002",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "rce",
        severity: Severity::Critical,
        patterns: vec![
            Regex::new(r"\b(eval|assert)\s*\(\s*\$").expect("RCE-002: invalid regex"),
            Regex::new(r"\bcreate_function\s*\(").expect("RCE-002: invalid regex"),
            Regex::new(r"\bpreg_replace\s*\(\s*['\x22].*/[a-zA-Z]*e[a-zA-Z]*['\x22]")
                .expect("RCE-002: invalid regex"),
        ],
        exclusions: vec![],
        message: "Dynamic PHP code evaluation",
        exploit: "Attacker-influenced input reaching eval() is executed as PHP code",
        fix: "Remove dynamic evaluation; dispatch through a fixed allow-list instead",
        cwe_ids: &["CWE-95"],
    }
}

fn rce_003() -> Rule {
    Rule {
        id: "RCE-003",
        languages: &[Language::Python],
        scope: RuleScope::Line,
        kind: "rce",
        severity: Severity::High,
        patterns: vec![
            Regex::new(r"\bos\.(system|popen)\s*\(").expect("RCE-003: invalid regex"),
            Regex::new(r"\bsubprocess\.\w+\(.*shell\s*=\s*True").expect("RCE-003: invalid regex"),
            Regex::new(r"\b(eval|exec)\s*\(\s*[a-zA-Z_]").expect("RCE-003: invalid regex"),
        ],
        exclusions: vec![],
        message: "Shell or code execution from Python",
        exploit: "Input reaching a shell or eval call allows command injection",
        fix: "Call subprocess with an argument list and shell=False; never eval input",
        cwe_ids: &["CWE-78"],
    }
}

fn rce_004() -> Rule {
    Rule {
        id: "RCE-004",
        languages: &[Language::Js],
        scope: RuleScope::Line,
        kind: "rce",
        severity: Severity::Medium,
        patterns: vec![
            Regex::new(r"\beval\s*\(\s*[a-zA-Z_$]").expect("RCE-004: invalid regex"),
            Regex::new(r"\bnew\s+Function\s*\(").expect("RCE-004: invalid regex"),
        ],
        exclusions: vec![],
        message: "Dynamic JavaScript evaluation",
        exploit: "Strings evaluated in the browser run with the page's privileges",
        fix: "Parse data with JSON.parse and avoid eval/new Function",
        cwe_ids: &["CWE-95"],
    }
}

fn sqli_001() -> Rule {
    Rule {
        id: "SQLI-001",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "sqli",
        severity: Severity::High,
        patterns: vec![
            Regex::new(r#"\$wpdb\s*->\s*(query|get_results|get_row|get_var|get_col)\s*\(\s*"[^"]*\$"#)
                .expect("SQLI-001: invalid regex"),
            Regex::new(r"\$wpdb\s*->\s*(query|get_results|get_row|get_var|get_col)\s*\([^)]*\.\s*\$_(GET|POST|REQUEST|COOKIE)")
                .expect("SQLI-001: invalid regex"),
        ],
        exclusions: vec![Regex::new(r"->\s*prepare\s*\(").expect("SQLI-001: invalid regex")],
        message: "Database query built from variables without $wpdb->prepare()",
        exploit: "Request data concatenated into SQL lets an attacker read or modify the database",
        fix: "Build the statement with $wpdb->prepare() and placeholders",
        cwe_ids: &["CWE-89"],
    }
}

fn sqli_002() -> Rule {
    Rule {
        id: "SQLI-002",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "sqli",
        severity: Severity::High,
        patterns: vec![
            Regex::new(r#"(?i)"\s*(SELECT|INSERT|UPDATE|DELETE)\b[^"]*'\$\w+"#)
                .expect("SQLI-002: invalid regex"),
            Regex::new(r#"(?i)["']\s*(SELECT|INSERT|UPDATE|DELETE)\b.*\.\s*\$_(GET|POST|REQUEST|COOKIE)"#)
                .expect("SQLI-002: invalid regex"),
        ],
        exclusions: vec![Regex::new(r"->\s*prepare\s*\(").expect("SQLI-002: invalid regex")],
        message: "SQL string interpolates a variable",
        exploit: "Quoted interpolation of request data is a classic injection point",
        fix: "Use $wpdb->prepare() with %s/%d placeholders",
        cwe_ids: &["CWE-89"],
    }
}

fn path_001() -> Rule {
    Rule {
        id: "PATH-001",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "path_traversal",
        severity: Severity::High,
        patterns: vec![
            Regex::new(r"\b(include|require)(_once)?\b[^;]*\$_(GET|POST|REQUEST|COOKIE)")
                .expect("PATH-001: invalid regex"),
            Regex::new(r"\b(readfile|file_get_contents|fopen|unlink|file_put_contents)\s*\([^;]*\$_(GET|POST|REQUEST|COOKIE)")
                .expect("PATH-001: invalid regex"),
        ],
        exclusions: vec![
            Regex::new(r"\b(basename|sanitize_file_name|validate_file)\s*\(")
                .expect("PATH-001: invalid regex"),
        ],
        message: "File path taken from request data",
        exploit: "Sequences like ../ let an attacker read or include arbitrary files",
        fix: "Map request values to an allow-list of files or pass them through basename()",
        cwe_ids: &["CWE-22"],
    }
}

fn ssrf_001() -> Rule {
    Rule {
        id: "SSRF-001",
        languages: &[Language::Php],
        scope: RuleScope::Line,
        kind: "ssrf",
        severity: Severity::High,
        patterns: vec![
            Regex::new(r"\b(wp_remote_get|wp_remote_post|wp_remote_request|wp_remote_head|curl_init)\s*\([^;]*\$_(GET|POST|REQUEST|COOKIE)")
                .expect("SSRF-001: invalid regex"),
        ],
        exclusions: vec![
            Regex::new(r"\bwp_safe_remote_(get|post|request)\s*\(").expect("SSRF-001: invalid regex"),
        ],
        message: "Outbound request to a URL taken from request data",
        exploit: "The server can be made to reach internal services or cloud metadata endpoints",
        fix: "Use wp_safe_remote_get() and validate the host against an allow-list",
        cwe_ids: &["CWE-918"],
    }
}
