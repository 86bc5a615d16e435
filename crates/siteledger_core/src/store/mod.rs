//! Blob store abstraction and implementations.
//!
//! # Responsibility
//! - Define the key/bytes persistence contract the repository consumes.
//! - Provide file-per-key and SQLite-row-per-key backends.
//!
//! # Invariants
//! - `write` replaces the whole value for a key; there are no partial updates.
//! - `list_keys` returns keys in ascending order.
//! - `load`/`delete` on an absent key return `StoreError::NotFound`.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod file_store;
pub mod sqlite_store;

pub use file_store::FileBlobStore;
pub use sqlite_store::SqliteBlobStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Blob store failure.
#[derive(Debug)]
pub enum StoreError {
    /// No value stored under the key.
    NotFound(String),
    /// Filesystem failure for one key (or the store directory when `key` is empty).
    Io {
        key: String,
        source: std::io::Error,
    },
    /// SQLite backend failure.
    Sqlite(DbError),
    /// A previous holder panicked while owning the backend handle.
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "no stored record for key `{key}`"),
            Self::Io { key, source } if key.is_empty() => write!(f, "store i/o failed: {source}"),
            Self::Io { key, source } => write!(f, "store i/o failed for key `{key}`: {source}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "store handle poisoned by an earlier panic"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::NotFound(_) | Self::Poisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Sqlite(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(DbError::Sqlite(value))
    }
}

/// Generic key/byte-sequence persistence collaborator.
pub trait BlobStore: Send + Sync {
    fn exists(&self, key: &str) -> StoreResult<bool>;
    fn load(&self, key: &str) -> StoreResult<Vec<u8>>;
    fn write(&self, key: &str, data: &[u8]) -> StoreResult<()>;
    fn delete(&self, key: &str) -> StoreResult<()>;
    fn list_keys(&self) -> StoreResult<Vec<String>>;
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        (**self).exists(key)
    }

    fn load(&self, key: &str) -> StoreResult<Vec<u8>> {
        (**self).load(key)
    }

    fn write(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        (**self).write(key, data)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn list_keys(&self) -> StoreResult<Vec<String>> {
        (**self).list_keys()
    }
}
