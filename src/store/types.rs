use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Finding count recorded when an attempt failed before producing one.
pub const FAILED_COUNT: i64 = -1;

/// How a work item's source is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum TransportKind {
    /// Subversion checkout (registry trunk).
    Svn,
    /// Shallow clone from a hosted git service.
    GitHosted,
    /// Zip archive download.
    Archive,
    /// Unknown origin; fetched like an archive.
    #[default]
    Unknown,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Svn => "SVN",
            TransportKind::GitHosted => "GIT_HOSTED",
            TransportKind::Archive => "ARCHIVE",
            TransportKind::Unknown => "UNKNOWN",
        }
    }

    /// Guess the transport from the shape of a locator.
    pub fn infer(locator: &str) -> Self {
        let lower = locator.trim().to_ascii_lowercase();
        let without_slash = lower.trim_end_matches('/');

        if lower.starts_with("svn://")
            || lower.starts_with("svn+ssh://")
            || lower.contains("plugins.svn.")
            || lower.contains("themes.svn.")
        {
            return TransportKind::Svn;
        }

        if lower.starts_with("git@")
            || without_slash.ends_with(".git")
            || ["github.com/", "gitlab.com/", "bitbucket.org/"]
                .iter()
                .any(|host| lower.contains(host))
        {
            return TransportKind::GitHosted;
        }

        if without_slash.ends_with(".zip") {
            return TransportKind::Archive;
        }

        TransportKind::Unknown
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SVN" => Ok(TransportKind::Svn),
            "GIT_HOSTED" | "GIT" | "GITHUB" | "GITLAB" | "BITBUCKET" => {
                Ok(TransportKind::GitHosted)
            }
            "ARCHIVE" | "ZIP" => Ok(TransportKind::Archive),
            "UNKNOWN" | "" => Ok(TransportKind::Unknown),
            other => Err(format!("unknown transport kind: {other}")),
        }
    }
}

impl TryFrom<String> for TransportKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl ToSql for TransportKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransportKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Status of a work item's last attempt. `Pending` means no attempt has
/// been recorded; it is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Ok,
    Error,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Ok => "ok",
            ScanStatus::Error => "error",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ScanStatus::Pending),
            "ok" => Ok(ScanStatus::Ok),
            "error" => Ok(ScanStatus::Error),
            other => Err(format!("unknown scan status: {other}")),
        }
    }
}

impl ToSql for ScanStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ScanStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Terminal result of one attempt. Always written as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: ScanStatus,
    /// Number of findings, or [`FAILED_COUNT`] when the attempt failed.
    pub finding_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl Outcome {
    pub fn ok(finding_count: usize, completed_at: DateTime<Utc>) -> Self {
        Self {
            status: ScanStatus::Ok,
            finding_count: i64::try_from(finding_count).unwrap_or(i64::MAX),
            error_detail: None,
            completed_at,
        }
    }

    pub fn error(detail: impl Into<String>, completed_at: DateTime<Utc>) -> Self {
        Self {
            status: ScanStatus::Error,
            finding_count: FAILED_COUNT,
            error_detail: Some(detail.into()),
            completed_at,
        }
    }
}

/// One repository in the worklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub identifier: String,
    #[serde(default)]
    pub display_name: String,
    pub source_locator: String,
    #[serde(default)]
    pub transport_kind: TransportKind,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<Outcome>,
}

impl WorkItem {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        source_locator: impl Into<String>,
        transport_kind: TransportKind,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            source_locator: source_locator.into(),
            transport_kind,
            last_outcome: None,
        }
    }

    /// Build an uncataloged item for a single-shot scan of `locator`.
    pub fn from_locator(locator: &str) -> Self {
        let identifier = identifier_from_locator(locator);
        Self::new(
            identifier.clone(),
            identifier,
            locator.trim(),
            TransportKind::infer(locator),
        )
    }

    pub fn status(&self) -> ScanStatus {
        self.last_outcome
            .as_ref()
            .map_or(ScanStatus::Pending, |o| o.status)
    }
}

/// Derive a slug from the last meaningful path segment of a locator.
pub fn identifier_from_locator(locator: &str) -> String {
    let trimmed = locator.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/trunk").unwrap_or(trimmed);

    let last = trimmed
        .rsplit(['/', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("item");
    let last = last.strip_suffix(".git").unwrap_or(last);
    let last = last.strip_suffix(".zip").unwrap_or(last);

    if last.is_empty() {
        "item".to_string()
    } else {
        last.to_string()
    }
}

/// Per-status totals across the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub ok: usize,
    pub error: usize,
    /// Sum of finding counts over `ok` items.
    pub findings: i64,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.ok + self.error
    }
}
