//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::model::{
    AnalysisResult, HeadingCounts, Link, StoredAnalysis, StoredLink, TaskId, UrlRecord, UrlStatus,
};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::InsightError;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
///
/// A single connection is shared behind a mutex, so every trait call is
/// serialized and atomic from the caller's point of view.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(InsightError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, InsightError> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(StorageError::from)?;

        initialize_schema(&conn).map_err(StorageError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> Result<Self, InsightError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StorageError::from)?;
        initialize_schema(&conn).map_err(StorageError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection mutex poisoned".to_string()))
    }
}

fn db_id(id: TaskId) -> StorageResult<i64> {
    i64::try_from(id).map_err(|_| StorageError::InvalidData(format!("id {} out of range", id)))
}

fn task_id(raw: i64) -> rusqlite::Result<TaskId> {
    TaskId::try_from(raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, raw))
}

/// Columns of a `urls` row before the status string is decoded
struct RawRecord {
    id: i64,
    original_url: String,
    status: String,
    created_at: String,
    updated_at: String,
}

const RECORD_COLUMNS: &str = "id, original_url, status, created_at, updated_at";

fn read_record(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get(0)?,
        original_url: row.get(1)?,
        status: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl RawRecord {
    fn decode(self) -> StorageResult<UrlRecord> {
        let status = UrlStatus::from_db_string(&self.status).ok_or_else(|| {
            StorageError::InvalidData(format!(
                "URL {} has unknown status '{}'",
                self.id, self.status
            ))
        })?;
        Ok(UrlRecord {
            id: task_id(self.id)?,
            original_url: self.original_url,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn record_exists(conn: &Connection, id: i64) -> StorageResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM urls WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

/// Inserts one analysis result and its links in slice order
fn insert_analysis(
    conn: &Connection,
    url_id: i64,
    result: &AnalysisResult,
    links: &[Link],
    now: &str,
) -> StorageResult<i64> {
    let h = result.headings;
    conn.execute(
        "INSERT INTO analysis_results
         (url_id, html_version, title, h1_count, h2_count, h3_count, h4_count, h5_count,
          h6_count, has_login_form, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            url_id,
            result.html_version,
            result.title,
            h.h1,
            h.h2,
            h.h3,
            h.h4,
            h.h5,
            h.h6,
            result.has_login_form,
            now
        ],
    )?;
    let analysis_id = conn.last_insert_rowid();

    let mut stmt = conn.prepare(
        "INSERT INTO links (url_id, analysis_id, href, is_external, status_code, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for link in links {
        stmt.execute(params![
            url_id,
            analysis_id,
            link.href,
            link.is_external,
            link.status_code,
            now
        ])?;
    }

    Ok(analysis_id)
}

/// Compare-and-set of a record's status; returns the number of rows changed
fn update_status_if(
    conn: &Connection,
    url_id: i64,
    from: &[UrlStatus],
    to: UrlStatus,
    now: &str,
) -> StorageResult<usize> {
    if from.is_empty() {
        return Ok(0);
    }

    let placeholders = (0..from.len())
        .map(|i| format!("?{}", i + 4))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE urls SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status IN ({})",
        placeholders
    );

    let mut values = vec![
        Value::from(to.to_db_string().to_string()),
        Value::from(now.to_string()),
        Value::from(url_id),
    ];
    values.extend(
        from.iter()
            .map(|status| Value::from(status.to_db_string().to_string())),
    );

    Ok(conn.execute(&sql, params_from_iter(values))?)
}

impl RecordStore for SqliteStorage {
    // ===== Engine Contract =====

    fn load(&self, id: TaskId) -> StorageResult<UrlRecord> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM urls WHERE id = ?1", RECORD_COLUMNS),
            params![db_id(id)?],
            read_record,
        )
        .optional()?
        .ok_or(StorageError::NotFound(id))?
        .decode()
    }

    fn set_status(&self, id: TaskId, status: UrlStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE urls SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, db_id(id)?],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn save_analysis_batch(
        &self,
        id: TaskId,
        result: &AnalysisResult,
        links: &[Link],
    ) -> StorageResult<i64> {
        let url_id = db_id(id)?;
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if !record_exists(&tx, url_id)? {
            return Err(StorageError::NotFound(id));
        }

        let analysis_id = insert_analysis(&tx, url_id, result, links, &now)?;

        tx.commit()?;
        Ok(analysis_id)
    }

    fn transition_status(
        &self,
        id: TaskId,
        from: &[UrlStatus],
        to: UrlStatus,
    ) -> StorageResult<bool> {
        let url_id = db_id(id)?;
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;

        if update_status_if(&conn, url_id, from, to, &now)? == 1 {
            return Ok(true);
        }
        if !record_exists(&conn, url_id)? {
            return Err(StorageError::NotFound(id));
        }
        Ok(false)
    }

    fn complete_analysis(
        &self,
        id: TaskId,
        result: &AnalysisResult,
        links: &[Link],
    ) -> StorageResult<Option<i64>> {
        let url_id = db_id(id)?;
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if update_status_if(&tx, url_id, &[UrlStatus::Running], UrlStatus::Done, &now)? == 0 {
            if !record_exists(&tx, url_id)? {
                return Err(StorageError::NotFound(id));
            }
            // Dropping the transaction rolls back; nothing was written
            return Ok(None);
        }

        let analysis_id = insert_analysis(&tx, url_id, result, links, &now)?;
        tx.commit()?;
        Ok(Some(analysis_id))
    }

    // ===== Service Helpers =====

    fn create_url(&self, address: &str) -> StorageResult<TaskId> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO urls (original_url, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(original_url) DO NOTHING",
            params![address, UrlStatus::Queued.to_db_string(), now],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM urls WHERE original_url = ?1",
            params![address],
            |row| row.get(0),
        )?;
        Ok(task_id(id)?)
    }

    fn list_urls(&self) -> StorageResult<Vec<UrlRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM urls ORDER BY id", RECORD_COLUMNS))?;

        let raw = stmt
            .query_map([], read_record)?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(RawRecord::decode).collect()
    }

    fn analysis_results(&self, id: TaskId) -> StorageResult<Vec<StoredAnalysis>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, url_id, html_version, title, h1_count, h2_count, h3_count, h4_count,
             h5_count, h6_count, has_login_form, created_at
             FROM analysis_results WHERE url_id = ?1 ORDER BY id",
        )?;

        let results = stmt
            .query_map(params![db_id(id)?], |row| {
                Ok(StoredAnalysis {
                    id: row.get(0)?,
                    url_id: task_id(row.get(1)?)?,
                    result: AnalysisResult {
                        html_version: row.get(2)?,
                        title: row.get(3)?,
                        headings: HeadingCounts {
                            h1: row.get(4)?,
                            h2: row.get(5)?,
                            h3: row.get(6)?,
                            h4: row.get(7)?,
                            h5: row.get(8)?,
                            h6: row.get(9)?,
                        },
                        has_login_form: row.get(10)?,
                    },
                    created_at: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }

    fn links(&self, id: TaskId) -> StorageResult<Vec<StoredLink>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, url_id, analysis_id, href, is_external, status_code
             FROM links WHERE url_id = ?1 ORDER BY id",
        )?;

        let links = stmt
            .query_map(params![db_id(id)?], |row| {
                Ok(StoredLink {
                    id: row.get(0)?,
                    url_id: task_id(row.get(1)?)?,
                    analysis_id: row.get(2)?,
                    link: Link {
                        href: row.get(3)?,
                        is_external: row.get(4)?,
                        status_code: row.get(5)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }
}
