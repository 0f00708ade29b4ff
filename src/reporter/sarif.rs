use crate::reporter::Reporter;
use crate::rules::{Finding, ScanResult, Severity};
use serde::Serialize;
use std::collections::BTreeSet;

const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

pub struct SarifReporter;

impl SarifReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SarifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for SarifReporter {
    fn report(&self, result: &ScanResult) -> String {
        let sarif = SarifReport::from_scan_result(result);
        serde_json::to_string_pretty(&sarif)
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize SARIF: {}"}}"#, e))
    }
}

#[derive(Debug, Serialize)]
pub struct SarifReport {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub taxonomies: Vec<SarifTaxonomy>,
}

#[derive(Debug, Serialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    pub id: String,
    pub name: String,
    pub short_description: SarifMessage,
    pub properties: SarifRuleProperties,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<SarifRelationship>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRelationship {
    pub target: SarifRelationshipTarget,
    pub kinds: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRelationshipTarget {
    pub id: String,
    pub tool_component: SarifToolComponentRef,
}

#[derive(Debug, Serialize)]
pub struct SarifToolComponentRef {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifTaxonomy {
    pub name: String,
    pub information_uri: String,
    pub taxa: Vec<SarifTaxon>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifTaxon {
    pub id: String,
    pub help_uri: String,
}

#[derive(Debug, Serialize)]
pub struct SarifRuleProperties {
    #[serde(rename = "security-severity")]
    pub security_severity: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: SarifArtifactLocation,
    pub region: SarifRegion,
}

#[derive(Debug, Serialize)]
pub struct SarifArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    pub start_line: usize,
}

impl SarifReport {
    /// One rule per distinct finding type; the rule takes the highest
    /// severity and the union of CWE ids seen for that type.
    pub fn from_scan_result(result: &ScanResult) -> Self {
        let mut kinds: Vec<&str> = result.findings.iter().map(|f| f.kind.as_str()).collect();
        kinds.sort_unstable();
        kinds.dedup();

        let mut all_cwe_ids = BTreeSet::new();
        let rules: Vec<SarifRule> = kinds
            .into_iter()
            .map(|kind| {
                let of_kind: Vec<&Finding> =
                    result.findings.iter().filter(|f| f.kind == kind).collect();
                let severity = of_kind
                    .iter()
                    .map(|f| f.severity)
                    .max()
                    .unwrap_or_default();
                let cwe_ids: BTreeSet<&str> = of_kind
                    .iter()
                    .flat_map(|f| f.cwe.iter().map(String::as_str))
                    .collect();
                all_cwe_ids.extend(cwe_ids.iter().map(|id| id.to_string()));

                let mut tags = vec!["security".to_string()];
                tags.extend(cwe_ids.iter().map(|id| id.to_string()));

                SarifRule {
                    id: kind.to_string(),
                    name: kind.to_string(),
                    short_description: SarifMessage {
                        text: of_kind
                            .first()
                            .map(|f| f.description.clone())
                            .filter(|d| !d.is_empty())
                            .unwrap_or_else(|| kind.to_string()),
                    },
                    properties: SarifRuleProperties {
                        security_severity: Self::severity_to_score(severity).to_string(),
                        tags,
                    },
                    relationships: cwe_ids
                        .iter()
                        .map(|id| SarifRelationship {
                            target: SarifRelationshipTarget {
                                id: id.to_string(),
                                tool_component: SarifToolComponentRef {
                                    name: "CWE".to_string(),
                                },
                            },
                            kinds: vec!["superset".to_string()],
                        })
                        .collect(),
                }
            })
            .collect();

        let results = result
            .findings
            .iter()
            .map(|f| SarifResult {
                rule_id: f.kind.clone(),
                level: Self::severity_to_level(f.severity).to_string(),
                message: SarifMessage {
                    text: Self::message_text(f),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation {
                            uri: f.file.clone(),
                        },
                        region: SarifRegion {
                            start_line: f.line.max(1),
                        },
                    },
                }],
            })
            .collect();

        let taxonomies = if all_cwe_ids.is_empty() {
            vec![]
        } else {
            vec![SarifTaxonomy {
                name: "CWE".to_string(),
                information_uri: "https://cwe.mitre.org/".to_string(),
                taxa: all_cwe_ids
                    .into_iter()
                    .map(|id| SarifTaxon {
                        help_uri: format!(
                            "https://cwe.mitre.org/data/definitions/{}.html",
                            id.strip_prefix("CWE-").unwrap_or(&id)
                        ),
                        id,
                    })
                    .collect(),
            }]
        };

        SarifReport {
            schema: SARIF_SCHEMA.to_string(),
            version: "2.1.0".to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "plugin-audit".to_string(),
                        version: result.version.clone(),
                        rules,
                    },
                },
                results,
                taxonomies,
            }],
        }
    }

    fn message_text(finding: &Finding) -> String {
        let mut text = finding.description.clone();
        if let Some(snippet) = finding.snippet.as_deref().filter(|s| !s.is_empty()) {
            text.push_str(&format!("\n\nCode: {snippet}"));
        }
        if let Some(fix) = finding.fix.as_deref().filter(|s| !s.is_empty()) {
            text.push_str(&format!("\n\nFix: {fix}"));
        }
        text
    }

    fn severity_to_level(severity: Severity) -> &'static str {
        match severity {
            Severity::Critical | Severity::High => "error",
            Severity::Medium => "warning",
            Severity::Low | Severity::Info => "note",
        }
    }

    fn severity_to_score(severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => "9.0",
            Severity::High => "7.0",
            Severity::Medium => "5.0",
            Severity::Low => "3.0",
            Severity::Info => "1.0",
        }
    }
}
