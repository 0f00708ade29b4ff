use crate::reporter::Reporter;
use crate::rules::{Finding, ScanResult, Severity};
use colored::Colorize;

/// Rows printed in the findings table before the remainder is elided.
pub const MAX_TABLE_ROWS: usize = 50;

const FILE_WIDTH: usize = 48;

pub struct TerminalReporter {
    max_rows: usize,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            max_rows: MAX_TABLE_ROWS,
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    fn severity_color(&self, severity: Severity) -> colored::ColoredString {
        // Pad before colouring so escape codes do not break the column width.
        let label = format!("{:<8}", severity.to_string());
        match severity {
            Severity::Critical => label.red().bold(),
            Severity::High => label.yellow().bold(),
            Severity::Medium => label.cyan(),
            Severity::Low => label.white(),
            Severity::Info => label.dimmed(),
        }
    }

    fn format_row(&self, finding: &Finding) -> String {
        format!(
            "  {:<file_width$} {:>5}  {:<16} {}\n",
            shorten_path(&finding.file, FILE_WIDTH),
            finding.line,
            finding.kind,
            self.severity_color(finding.severity),
            file_width = FILE_WIDTH
        )
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the tail of long paths, which carries the file name.
fn shorten_path(path: &str, width: usize) -> String {
    let count = path.chars().count();
    if count <= width {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - (width - 3)).collect();
    format!("...{tail}")
}

impl Reporter for TerminalReporter {
    fn report(&self, result: &ScanResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            format!("plugin-audit v{} - plugin security scan", result.version).bold()
        ));
        output.push_str(&format!("Target: {}\n\n", result.target));

        if result.findings.is_empty() {
            output.push_str(&"No security issues found.\n".green().to_string());
        } else {
            let header = format!(
                "  {:<file_width$} {:>5}  {:<16} {}",
                "FILE",
                "LINE",
                "TYPE",
                "SEVERITY",
                file_width = FILE_WIDTH
            );
            output.push_str(&format!("{}\n", header.bold()));
            for finding in result.findings.iter().take(self.max_rows) {
                output.push_str(&self.format_row(finding));
            }
            if result.findings.len() > self.max_rows {
                output.push_str(&format!(
                    "  {}\n",
                    format!("... and {} more", result.findings.len() - self.max_rows).dimmed()
                ));
            }
        }

        output.push('\n');
        output.push_str(&format!("{}\n", "━".repeat(50)));
        output.push_str(&format!(
            "Summary: {} finding(s) - {} critical, {} high, {} medium, {} low, {} info\n",
            result.summary.total(),
            result.summary.critical.to_string().red().bold(),
            result.summary.high.to_string().yellow().bold(),
            result.summary.medium.to_string().cyan(),
            result.summary.low,
            result.summary.info
        ));

        let result_text = if result.summary.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        output.push_str(&format!("Result: {}\n", result_text));

        output
    }
}
