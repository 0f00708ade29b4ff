//! Detection benchmark over a labeled corpus.
//!
//! A YAML manifest lists cases as `{id, file, type, expected}`. Each file is
//! analyzed on its own and the case is classified by whether a finding of
//! the labeled `type` came back.

mod error;

pub use error::BenchmarkError;

use crate::analyzer::Analyzer;
use crate::rules::Finding;
use crate::scan::ScanOrchestrator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// One labeled sample.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkCase {
    pub id: String,
    /// Path relative to the corpus directory.
    pub file: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the file contains a vulnerability of `kind`.
    pub expected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "TP")]
    TruePositive,
    #[serde(rename = "TN")]
    TrueNegative,
    #[serde(rename = "FP")]
    FalsePositive,
    #[serde(rename = "FN")]
    FalseNegative,
}

impl Verdict {
    pub fn classify(expected: bool, detected: bool) -> Self {
        match (expected, detected) {
            (true, true) => Verdict::TruePositive,
            (false, false) => Verdict::TrueNegative,
            (false, true) => Verdict::FalsePositive,
            (true, false) => Verdict::FalseNegative,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    #[serde(rename = "tp")]
    pub true_positives: usize,
    #[serde(rename = "tn")]
    pub true_negatives: usize,
    #[serde(rename = "fp")]
    pub false_positives: usize,
    #[serde(rename = "fn")]
    pub false_negatives: usize,
}

impl Tally {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::TruePositive => self.true_positives += 1,
            Verdict::TrueNegative => self.true_negatives += 1,
            Verdict::FalsePositive => self.false_positives += 1,
            Verdict::FalseNegative => self.false_negatives += 1,
        }
    }

    pub fn misclassified(&self) -> usize {
        self.false_positives + self.false_negatives
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BenchmarkStats {
    pub total: usize,
    #[serde(flatten)]
    pub overall: Tally,
    pub per_type: BTreeMap<String, Tally>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub id: String,
    pub file: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub expected: bool,
    pub has_vuln: bool,
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BenchmarkReport {
    pub stats: BenchmarkStats,
    pub results: Vec<CaseResult>,
}

impl BenchmarkReport {
    /// Write the per-case results as a pretty JSON array.
    pub fn write_results(&self, path: &Path) -> Result<(), BenchmarkError> {
        let json = serde_json::to_string_pretty(&self.results)?;
        std::fs::write(path, json).map_err(|source| BenchmarkError::WriteResults {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn load_manifest(path: &Path) -> Result<Vec<BenchmarkCase>, BenchmarkError> {
    let content =
        std::fs::read_to_string(path).map_err(|source| BenchmarkError::ReadManifest {
            path: path.to_path_buf(),
            source,
        })?;
    serde_yaml::from_str(&content).map_err(|source| BenchmarkError::ParseManifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Analyze every case file under `corpus` and classify the outcome.
///
/// A case whose file is missing aborts the run, since it would otherwise
/// count as a silent miss.
pub fn run_cases<A: Analyzer>(
    cases: &[BenchmarkCase],
    corpus: &Path,
    scanner: &ScanOrchestrator<A>,
) -> Result<BenchmarkReport, BenchmarkError> {
    let mut report = BenchmarkReport::default();

    for case in cases {
        let path = corpus.join(&case.file);
        if !path.is_file() {
            return Err(BenchmarkError::MissingCase {
                id: case.id.clone(),
                path,
            });
        }

        let findings = scanner.scan_file(&path);
        let has_vuln = findings.iter().any(|f| f.kind == case.kind);
        let verdict = Verdict::classify(case.expected, has_vuln);
        debug!(id = %case.id, kind = %case.kind, findings = findings.len(), verdict = ?verdict, "Benchmark case");

        report.stats.total += 1;
        report.stats.overall.record(verdict);
        report
            .stats
            .per_type
            .entry(case.kind.clone())
            .or_default()
            .record(verdict);

        report.results.push(CaseResult {
            id: case.id.clone(),
            file: case.file.clone(),
            kind: case.kind.clone(),
            expected: case.expected,
            has_vuln,
            verdict,
            findings,
        });
    }

    info!(
        total = report.stats.total,
        misclassified = report.stats.overall.misclassified(),
        "Benchmark finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::rules::Severity;
    use crate::test_utils::fixtures::{StubAnalyzer, create_finding};
    use std::fs;
    use tempfile::TempDir;

    fn case(id: &str, file: &str, kind: &str, expected: bool) -> BenchmarkCase {
        BenchmarkCase {
            id: id.to_string(),
            file: file.to_string(),
            kind: kind.to_string(),
            expected,
        }
    }

    fn corpus(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            fs::write(dir.path().join(file), "<?php\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_classify() {
        assert_eq!(Verdict::classify(true, true), Verdict::TruePositive);
        assert_eq!(Verdict::classify(false, false), Verdict::TrueNegative);
        assert_eq!(Verdict::classify(false, true), Verdict::FalsePositive);
        assert_eq!(Verdict::classify(true, false), Verdict::FalseNegative);
    }

    #[test]
    fn test_load_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.yaml");
        fs::write(
            &path,
            "- id: sqli_vuln\n  file: sqli_vuln.php\n  type: sqli\n  expected: true\n\
             - id: sqli_safe\n  file: sqli_safe.php\n  type: sqli\n  expected: false\n",
        )
        .unwrap();

        let cases = load_manifest(&path).unwrap();
        assert_eq!(
            cases,
            vec![
                case("sqli_vuln", "sqli_vuln.php", "sqli", true),
                case("sqli_safe", "sqli_safe.php", "sqli", false),
            ]
        );
    }

    #[test]
    fn test_load_manifest_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_manifest(&dir.path().join("missing.yaml")).unwrap_err(),
            BenchmarkError::ReadManifest { .. }
        ));

        let path = dir.path().join("manifest.yaml");
        fs::write(&path, "- id: x\n  file: x.php\n").unwrap();
        assert!(matches!(
            load_manifest(&path).unwrap_err(),
            BenchmarkError::ParseManifest { .. }
        ));
    }

    #[test]
    fn test_run_cases_counts_verdicts_per_type() {
        let dir = corpus(&["rce_vuln.php", "rce_safe.php", "xss_vuln.php"]);
        // every file yields one rce finding and nothing else
        let scanner = ScanOrchestrator::new(
            StubAnalyzer::returning(vec![create_finding("rce", Severity::High, "", 2)]),
            &ScanConfig::default(),
        );
        let cases = vec![
            case("1", "rce_vuln.php", "rce", true),
            case("2", "rce_safe.php", "rce", false),
            case("3", "xss_vuln.php", "xss", true),
        ];

        let report = run_cases(&cases, dir.path(), &scanner).unwrap();
        let verdicts: Vec<Verdict> = report.results.iter().map(|r| r.verdict).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::TruePositive,
                Verdict::FalsePositive,
                Verdict::FalseNegative
            ]
        );

        assert_eq!(report.stats.total, 3);
        assert_eq!(report.stats.overall.misclassified(), 2);
        assert_eq!(report.stats.per_type["rce"].true_positives, 1);
        assert_eq!(report.stats.per_type["rce"].false_positives, 1);
        assert_eq!(report.stats.per_type["xss"].false_negatives, 1);
        assert_eq!(report.results[0].findings[0].file, "rce_vuln.php");
    }

    #[test]
    fn test_run_cases_missing_file() {
        let dir = corpus(&[]);
        let scanner = ScanOrchestrator::new(StubAnalyzer::returning(vec![]), &ScanConfig::default());
        let err = run_cases(&[case("gone", "gone.php", "rce", true)], dir.path(), &scanner)
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::MissingCase { ref id, .. } if id == "gone"));
    }

    #[test]
    fn test_stats_json_shape() {
        let mut stats = BenchmarkStats {
            total: 1,
            ..BenchmarkStats::default()
        };
        stats.overall.record(Verdict::FalseNegative);
        stats
            .per_type
            .entry("idor".to_string())
            .or_default()
            .record(Verdict::FalseNegative);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["fn"], 1);
        assert_eq!(json["tp"], 0);
        assert_eq!(json["per_type"]["idor"]["fn"], 1);
    }

    #[test]
    fn test_write_results() {
        let dir = corpus(&["a.php"]);
        let scanner = ScanOrchestrator::new(StubAnalyzer::returning(vec![]), &ScanConfig::default());
        let report = run_cases(&[case("a", "a.php", "sqli", false)], dir.path(), &scanner).unwrap();

        let out = dir.path().join("results.json");
        report.write_results(&out).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json[0]["id"], "a");
        assert_eq!(json[0]["type"], "sqli");
        assert_eq!(json[0]["verdict"], "TN");
        assert_eq!(json[0]["has_vuln"], false);
    }
}
