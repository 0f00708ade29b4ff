//! Durable worklist of repositories and their last scan outcome.
//!
//! One SQLite table keyed by identifier. Every write is a single statement,
//! so an interrupted run leaves each row either fully updated or untouched.
//! Resumption needs no lock: items without an outcome are simply selected
//! again, in identifier order.

mod error;
mod types;

pub use error::StoreError;
pub use types::{
    FAILED_COUNT, Outcome, ScanStatus, StatusCounts, TransportKind, WorkItem,
    identifier_from_locator,
};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use tracing::{debug, trace};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS work_items (
    identifier      TEXT PRIMARY KEY NOT NULL,
    display_name    TEXT NOT NULL,
    source_locator  TEXT NOT NULL,
    transport_kind  TEXT NOT NULL,
    last_status     TEXT CHECK (last_status IS NULL OR last_status IN ('ok', 'error')),
    finding_count   INTEGER,
    error_detail    TEXT,
    completed_at    TEXT
);

CREATE INDEX IF NOT EXISTS idx_work_items_unscanned
    ON work_items(identifier) WHERE last_status IS NULL;
"#;

const SELECT_COLUMNS: &str = "identifier, display_name, source_locator, transport_kind, \
     last_status, finding_count, error_detail, completed_at";

pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLite-backed progress store.
pub struct ProgressStore {
    conn: Connection,
}

impl ProgressStore {
    /// Open or create the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!(path = %path.display(), "Opened progress store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Insert an unseen item, or refresh the catalog fields of a known one.
    /// The outcome columns are never touched.
    pub fn upsert(&self, item: &WorkItem) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO work_items (identifier, display_name, source_locator, transport_kind)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(identifier) DO UPDATE SET
                   display_name = excluded.display_name,
                   source_locator = excluded.source_locator,
                   transport_kind = excluded.transport_kind"#,
            params![
                item.identifier,
                item.display_name,
                item.source_locator,
                item.transport_kind
            ],
        )?;
        trace!(identifier = %item.identifier, "Upserted work item");
        Ok(())
    }

    /// Upsert many items in one transaction. Returns the number written.
    pub fn upsert_all(&mut self, items: &[WorkItem]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO work_items (identifier, display_name, source_locator, transport_kind)
                   VALUES (?1, ?2, ?3, ?4)
                   ON CONFLICT(identifier) DO UPDATE SET
                       display_name = excluded.display_name,
                       source_locator = excluded.source_locator,
                       transport_kind = excluded.transport_kind"#,
            )?;
            for item in items {
                stmt.execute(params![
                    item.identifier,
                    item.display_name,
                    item.source_locator,
                    item.transport_kind
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = items.len(), "Upserted work items");
        Ok(items.len())
    }

    /// Overwrite every outcome column of `identifier` in one statement.
    pub fn record_outcome(&self, identifier: &str, outcome: &Outcome) -> Result<()> {
        if outcome.status == ScanStatus::Pending {
            return Err(StoreError::PendingOutcome(identifier.to_string()));
        }

        let updated = self.conn.execute(
            r#"UPDATE work_items
               SET last_status = ?2, finding_count = ?3, error_detail = ?4, completed_at = ?5
               WHERE identifier = ?1"#,
            params![
                identifier,
                outcome.status,
                outcome.finding_count,
                outcome.error_detail,
                outcome.completed_at.to_rfc3339()
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(identifier.to_string()));
        }
        trace!(identifier, status = %outcome.status, "Recorded outcome");
        Ok(())
    }

    /// Up to `limit` items without an outcome, ascending by identifier,
    /// starting at `resume_cursor` (inclusive) when given.
    pub fn next_batch(&self, limit: usize, resume_cursor: Option<&str>) -> Result<Vec<WorkItem>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM work_items \
             WHERE last_status IS NULL AND (?1 IS NULL OR identifier >= ?1) \
             ORDER BY identifier ASC LIMIT ?2"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![resume_cursor, limit], row_to_item)?;
        let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(count = items.len(), cursor = ?resume_cursor, "Selected next batch");
        Ok(items)
    }

    pub fn get(&self, identifier: &str) -> Result<Option<WorkItem>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM work_items WHERE identifier = ?1");
        let item = self
            .conn
            .query_row(&sql, [identifier], row_to_item)
            .optional()?;
        Ok(item)
    }

    pub fn counts(&self) -> Result<StatusCounts> {
        let counts = self.conn.query_row(
            r#"SELECT
                   COALESCE(SUM(CASE WHEN last_status IS NULL THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN last_status = 'ok' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN last_status = 'error' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN last_status = 'ok' THEN finding_count ELSE 0 END), 0)
               FROM work_items"#,
            [],
            |row| {
                Ok(StatusCounts {
                    pending: row.get::<_, i64>(0)?.max(0) as usize,
                    ok: row.get::<_, i64>(1)?.max(0) as usize,
                    error: row.get::<_, i64>(2)?.max(0) as usize,
                    findings: row.get(3)?,
                })
            },
        )?;
        Ok(counts)
    }

    /// Drop the outcome of every item whose last status is `status`, putting
    /// those items back in the queue. Returns the number of items reset.
    pub fn clear_outcomes(&self, status: ScanStatus) -> Result<usize> {
        if status == ScanStatus::Pending {
            return Ok(0);
        }
        let cleared = self.conn.execute(
            r#"UPDATE work_items
               SET last_status = NULL, finding_count = NULL, error_detail = NULL, completed_at = NULL
               WHERE last_status = ?1"#,
            [status],
        )?;
        debug!(status = %status, cleared, "Cleared outcomes");
        Ok(cleared)
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<WorkItem> {
    let status: Option<ScanStatus> = row.get(4)?;
    let last_outcome = match status {
        Some(status) => {
            let completed_at: String = row.get(7)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?
                .with_timezone(&Utc);
            Some(Outcome {
                status,
                finding_count: row.get(5)?,
                error_detail: row.get(6)?,
                completed_at,
            })
        }
        None => None,
    };

    Ok(WorkItem {
        identifier: row.get(0)?,
        display_name: row.get(1)?,
        source_locator: row.get(2)?,
        transport_kind: row.get(3)?,
        last_outcome,
    })
}
