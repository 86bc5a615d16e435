//! Directory-backed blob store, one file per key.
//!
//! # Invariants
//! - Key `k` lives at `<root>/k`; keys are used verbatim.
//! - Keys that are not a single plain path component never reach the
//!   filesystem: they read as absent and are refused on write.
//! - Writes land in a hidden temp file in `<root>` and are renamed into place,
//!   so readers never observe a half-written record.
//! - Dot-files and directories are never reported as keys.

use super::{BlobStore, StoreError, StoreResult};
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File system implementation of `BlobStore`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            key: String::new(),
            source,
        })?;
        debug!(
            "event=store_open module=store status=ok backend=file root={}",
            root.display()
        );
        Ok(Self { root })
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && !key.contains('\0')
}

// A directory squatting on a key reads as absent, matching `exists`.
fn io_error(key: &str, path: &Path, source: std::io::Error) -> StoreError {
    if source.kind() == ErrorKind::NotFound || path.is_dir() {
        StoreError::NotFound(key.to_string())
    } else {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl BlobStore for FileBlobStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        if !is_plain_key(key) {
            return Ok(false);
        }
        match fs::metadata(self.path_for(key)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn load(&self, key: &str) -> StoreResult<Vec<u8>> {
        if !is_plain_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let path = self.path_for(key);
        fs::read(&path).map_err(|err| io_error(key, &path, err))
    }

    fn write(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        if !is_plain_key(key) {
            return Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::new(
                    ErrorKind::InvalidInput,
                    "key is not a plain file name",
                ),
            });
        }
        let path = self.path_for(key);
        let tmp_path = self.root.join(format!(".{key}.{}.tmp", Uuid::new_v4()));

        fs::write(&tmp_path, data).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })?;

        if let Err(source) = fs::rename(&tmp_path, &path) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!(
                    "event=store_write module=store status=warn backend=file key={} error_code=tmp_cleanup_failed error={}",
                    key, cleanup
                );
            }
            return Err(StoreError::Io {
                key: key.to_string(),
                source,
            });
        }

        debug!(
            "event=store_write module=store status=ok backend=file key={} bytes={}",
            key,
            data.len()
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        if !is_plain_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let path = self.path_for(key);
        fs::remove_file(&path).map_err(|err| io_error(key, &path, err))?;
        debug!("event=store_delete module=store status=ok backend=file key={key}");
        Ok(())
    }

    fn list_keys(&self) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    key: String::new(),
                    source,
                })
            }
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                key: String::new(),
                source,
            })?;
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            keys.push(name);
        }

        keys.sort();
        Ok(keys)
    }
}
