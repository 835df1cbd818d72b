//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ProgressStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ProgressStore, StorageError, StorageResult};
use crate::storage::{ChapterIndex, ChapterRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and ensures the schema exists
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        series: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
        request_count: row.get::<_, i64>(6)?.max(0) as u64,
        total_bytes: row.get::<_, i64>(7)?.max(0) as u64,
    })
}

const RUN_COLUMNS: &str =
    "id, series, started_at, finished_at, config_hash, status, request_count, total_bytes";

impl ProgressStore for SqliteStorage {
    // ===== Chapter Index =====

    fn save(&mut self, series: &str, index: &ChapterIndex) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chapters (series, chapter, url, page_count, discovered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(series, chapter) DO UPDATE SET
                    page_count = CASE WHEN chapters.page_count = 0
                                      THEN excluded.page_count
                                      ELSE chapters.page_count END",
            )?;

            for (chapter, record) in index {
                stmt.execute(params![
                    series,
                    chapter,
                    record.chapter_url,
                    record.page_count,
                    now
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!("Saved chapter list ({} chapters) for {}", index.len(), series);
        Ok(())
    }

    fn load(&self, series: &str) -> StorageResult<Option<ChapterIndex>> {
        let mut stmt = self.conn.prepare(
            "SELECT chapter, url, page_count FROM chapters WHERE series = ?1 ORDER BY chapter",
        )?;

        let rows = stmt
            .query_map(params![series], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            tracing::info!("No chapter list found for {}", series);
            return Ok(None);
        }

        let mut index = ChapterIndex::new();
        for (chapter, url, page_count) in rows {
            let corrupt = |message: &str| StorageError::CorruptRecord {
                series: series.to_string(),
                chapter,
                message: message.to_string(),
            };
            let number = u32::try_from(chapter).map_err(|_| corrupt("chapter out of range"))?;
            let pages = u32::try_from(page_count).map_err(|_| corrupt("page count out of range"))?;
            index.insert(number, ChapterRecord::new(url, pages));
        }

        tracing::info!("Loaded chapter list ({} chapters) for {}", index.len(), series);
        Ok(Some(index))
    }

    fn count_chapters(&self, series: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chapters WHERE series = ?1",
            params![series],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, series: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (series, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![series, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        request_count: u64,
        total_bytes: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, request_count = ?3, total_bytes = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                request_count as i64,
                total_bytes as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn list_runs(&self, series: &str) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs WHERE series = ?1 ORDER BY id",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![series], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
