//! SQLite-backed snapshot store.
//!
//! Metadata and CSV text live in one table. The locator of a snapshot is its
//! row id.

use crate::store::SnapshotStore;
use async_trait::async_trait;
use bhav_core::{Error, Result, SnapshotMeta};
use bhav_ingestion::date_from_filename;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    trading_date TEXT,
    content TEXT NOT NULL,
    uploaded_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_snapshots_trading_date ON snapshots (trading_date);
";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

/// Snapshot store over a SQLite database.
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path).map_err(db_err)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(db_err)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::database("connection lock poisoned"))?;
        f(&conn).map_err(db_err)
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(f))
            .await
            .map_err(|e| Error::store(format!("blocking task failed: {e}")))?
    }

    /// Store an uploaded file. Without an explicit date, the filename is consulted.
    pub fn insert_snapshot(
        &self,
        filename: &str,
        trading_date: Option<NaiveDate>,
        content: &str,
    ) -> Result<SnapshotMeta> {
        let trading_date = trading_date.or_else(|| date_from_filename(filename));
        let date_text = trading_date.map(|d| d.format(DATE_FORMAT).to_string());

        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO snapshots (filename, trading_date, content) VALUES (?1, ?2, ?3)",
                params![filename, date_text, content],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(SnapshotMeta {
            id: id.to_string(),
            filename: filename.to_string(),
            trading_date,
            locator: id.to_string(),
        })
    }

    /// Delete snapshots whose trading date is before `cutoff`.
    ///
    /// Snapshots without a trading date are kept.
    pub fn delete_older_than(&self, cutoff: NaiveDate) -> Result<usize> {
        let cutoff_text = cutoff.format(DATE_FORMAT).to_string();
        let deleted = self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM snapshots WHERE trading_date IS NOT NULL AND trading_date < ?1",
                params![cutoff_text],
            )
        })?;

        info!(deleted, cutoff = %cutoff, "removed expired snapshots");
        Ok(deleted)
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
        let rows = self
            .blocking(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, filename, trading_date FROM snapshots ORDER BY id",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, filename, date_text)| SnapshotMeta {
                id: id.to_string(),
                filename,
                trading_date: date_text
                    .and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
                locator: id.to_string(),
            })
            .collect())
    }

    async fn fetch_content(&self, locator: &str) -> Result<String> {
        let id: i64 = locator
            .trim()
            .parse()
            .map_err(|_| Error::not_found(locator))?;

        let content = self
            .blocking(move |conn| {
                conn.query_row(
                    "SELECT content FROM snapshots WHERE id = ?1",
                    params![id],
                    |row| row.get::<_, String>(0),
                )
                .optional()
            })
            .await?;

        content.ok_or_else(|| Error::not_found(locator))
    }
}
