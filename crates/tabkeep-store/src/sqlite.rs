//! `SQLite`-backed [`KvStore`].
//!
//! One table, `kv(key, value, updated_at)`, with JSON text values. Every
//! call runs on the blocking pool; updates run inside an `IMMEDIATE`
//! transaction so the read and the write of one key can't interleave with
//! another writer, including one in a different process.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::kv::{KvStore, UpdateFn};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);";

/// Durable key-value store in a single `SQLite` file.
#[derive(Clone, Debug)]
pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!(?path, "opening state database");
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = 5000;\
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::init(conn)
    }

    /// Open a private in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
}

fn write_value(conn: &Connection, key: &str, value: &Value) -> Result<()> {
    let _ = conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value.to_string(), chrono::Utc::now().timestamp_millis()],
    )?;
    Ok(())
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || read_value(&conn.lock(), &key)).await?
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || write_value(&conn.lock(), &key, &value)).await?
    }

    async fn update(&self, key: &str, f: UpdateFn) -> Result<Option<Value>> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<Value>> {
            let mut conn = conn.lock();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let previous = read_value(&tx, &key)?;
            match f(previous.clone())? {
                Some(next) => write_value(&tx, &key, &next)?,
                None => {
                    let _ = tx.execute("DELETE FROM kv WHERE key = ?1", [&key])?;
                }
            }
            tx.commit()?;
            Ok(previous)
        })
        .await?
    }
}
