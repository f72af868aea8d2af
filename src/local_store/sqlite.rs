//! `rusqlite`/`r2d2`-backed [`KeyValueStore`].

use super::KeyValueStore;
use crate::error::StorageError;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};

pub struct SqliteKeyValueStore {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl SqliteKeyValueStore {
    /// Opens (creating if needed) the SQLite-backed kv table at `db_path`.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let manager = SqliteConnectionManager::file(&path);
        let pool = Pool::builder()
            .max_size(1) // single writer at a time, cooperatively
            .build(manager)
            .map_err(|source| StorageError::Open { path: path.clone(), source })?;

        let store = Self { pool, path };
        let conn = store.conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;

        Ok(store)
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, StorageError> {
        self.pool
            .get()
            .map_err(|source| StorageError::Open { path: self.path.clone(), source })
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(rusqlite::params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }
}
