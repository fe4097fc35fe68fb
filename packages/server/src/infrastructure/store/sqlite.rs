//! SQLite message store.
//!
//! rusqlite is synchronous, so the connection sits behind a std `Mutex` and
//! every query runs on the blocking pool via `spawn_blocking`.
//!
//! The timestamp column name is configurable (`created_at` or `timestamp`)
//! so an existing database of either shape can be reused. Timestamps are
//! stored as `YYYY-MM-DD HH:MM:SS` UTC text.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use agora_shared::time::{Clock, format_timestamp, parse_timestamp};
use async_trait::async_trait;
use clap::ValueEnum;
use rusqlite::{Connection, params};

use crate::domain::{DisplayName, MessageBody, MessageRecord, MessageStore, StoreError, Timestamp};

/// Column holding each message's creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HistoryColumn {
    #[value(name = "created_at")]
    CreatedAt,
    Timestamp,
}

impl HistoryColumn {
    pub fn as_sql(&self) -> &'static str {
        match self {
            HistoryColumn::CreatedAt => "created_at",
            HistoryColumn::Timestamp => "timestamp",
        }
    }
}

pub struct SqliteMessageStore {
    conn: Arc<Mutex<Connection>>,
    column: HistoryColumn,
    clock: Arc<dyn Clock>,
}

impl SqliteMessageStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(
        path: impl AsRef<Path>,
        column: HistoryColumn,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref()).map_err(backend)?;
        conn.pragma_update(None, "journal_mode", "WAL").map_err(backend)?;
        tracing::info!("Message store opened at {}", path.as_ref().display());
        Self::with_connection(conn, column, clock)
    }

    pub fn open_in_memory(column: HistoryColumn, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::with_connection(conn, column, clock)
    }

    fn with_connection(
        conn: Connection,
        column: HistoryColumn,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                message TEXT NOT NULL,
                {} TEXT NOT NULL
            )",
            column.as_sql()
        ))
        .map_err(backend)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            column,
            clock,
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Backend(format!("DB lock error: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append(&self, author: &DisplayName, body: &MessageBody) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO messages (username, message, {}) VALUES (?1, ?2, ?3)",
            self.column.as_sql()
        );
        let author = author.as_str().to_string();
        let body = body.as_str().to_string();
        let created_at = format_timestamp(self.clock.now_millis());

        self.with_conn(move |conn| {
            conn.execute(&sql, params![author, body, created_at])
                .map(|_| ())
                .map_err(backend)
        })
        .await
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<MessageRecord>, StoreError> {
        let sql = format!(
            "SELECT username, message, {} FROM messages ORDER BY id DESC LIMIT ?1",
            self.column.as_sql()
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(backend)?;
            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })
                .map_err(backend)?;

            // A row that no longer validates is skipped so the rest of the
            // history still replays.
            let mut records = Vec::new();
            for row in rows {
                let record = row
                    .map_err(backend)
                    .and_then(|(author, body, created_at)| to_record(author, body, &created_at));
                match record {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!("Skipping unreadable history row: {}", e),
                }
            }
            Ok(records)
        })
        .await
    }
}

fn to_record(author: String, body: String, created_at: &str) -> Result<MessageRecord, StoreError> {
    let author = DisplayName::new(author).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
    let body = MessageBody::new(body).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
    let created_at = parse_timestamp(created_at)
        .ok_or_else(|| StoreError::InvalidRecord(format!("bad timestamp '{}'", created_at)))?;
    Ok(MessageRecord::new(author, body, Timestamp::new(created_at)))
}
