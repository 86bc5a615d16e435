//! SQLite-backed blob store, one row per key in `site_blobs`.
//!
//! # Invariants
//! - The connection is migrated before the store is constructed.
//! - `write` is a single upsert statement, so each record write is atomic.

use super::{BlobStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite implementation of `BlobStore`.
pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

impl SqliteBlobStore {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database; contents vanish on drop.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl BlobStore for SqliteBlobStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        let exists: i64 = self.conn()?.query_row(
            "SELECT EXISTS(SELECT 1 FROM site_blobs WHERE key = ?1);",
            [key],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn load(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.conn()?
            .query_row(
                "SELECT data FROM site_blobs WHERE key = ?1;",
                [key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn write(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT INTO site_blobs (key, data) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                data = excluded.data,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, data],
        )?;
        debug!(
            "event=store_write module=store status=ok backend=sqlite key={} bytes={}",
            key,
            data.len()
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let changed = self
            .conn()?
            .execute("DELETE FROM site_blobs WHERE key = ?1;", [key])?;
        if changed == 0 {
            return Err(StoreError::NotFound(key.to_string()));
        }
        debug!("event=store_delete module=store status=ok backend=sqlite key={key}");
        Ok(())
    }

    fn list_keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM site_blobs ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteBlobStore;
    use crate::store::{BlobStore, StoreError};

    #[test]
    fn write_overwrites_and_delete_reports_missing() {
        let store = SqliteBlobStore::open_in_memory().unwrap();

        store.write("acme", b"one").unwrap();
        store.write("acme", b"two").unwrap();
        assert_eq!(store.load("acme").unwrap(), b"two");
        assert!(store.exists("acme").unwrap());

        store.delete("acme").unwrap();
        assert!(!store.exists("acme").unwrap());
        assert!(matches!(store.delete("acme"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.load("acme"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_keys_is_sorted() {
        let store = SqliteBlobStore::open_in_memory().unwrap();
        store.write("zeta", b"{}").unwrap();
        store.write("alpha", b"{}").unwrap();

        assert_eq!(store.list_keys().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.sqlite3");

        SqliteBlobStore::open(&path)
            .unwrap()
            .write("acme", b"persisted")
            .unwrap();

        let reopened = SqliteBlobStore::open(&path).unwrap();
        assert_eq!(reopened.load("acme").unwrap(), b"persisted");
    }
}
