//! Runtime configuration for store and logging setup.
//!
//! # Responsibility
//! - Describe where site records live and which backend stores them.
//! - Load settings from TOML and apply `SITELEDGER_*` environment overrides.
//!
//! # Invariants
//! - Configuration is an explicit value handed to constructors; nothing here
//!   touches process-wide state beyond reading environment variables.

use crate::logging::default_log_level;
use crate::store::{BlobStore, FileBlobStore, SqliteBlobStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_DATA_DIR: &str = "SITELEDGER_DATA_DIR";
pub const ENV_BACKEND: &str = "SITELEDGER_BACKEND";
pub const ENV_LOG_LEVEL: &str = "SITELEDGER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SITELEDGER_LOG_DIR";

const DEFAULT_DATA_DIR: &str = "./data";
// Dot-prefixed so a file backend sharing `data_dir` never lists it as a site.
const SQLITE_FILE_NAME: &str = ".sites.sqlite3";

/// Which blob store implementation backs the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One file per site under `data_dir`.
    #[default]
    File,
    /// One row per site in `data_dir/.sites.sqlite3`.
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::InvalidValue {
                key: "backend",
                value: other.to_string(),
            }),
        }
    }
}

/// Configuration loading failures.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        key: &'static str,
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for config key `{key}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Store and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub backend: StoreBackend,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            backend: StoreBackend::default(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads a TOML file; keys missing from the file keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `SITELEDGER_*` variables from the process environment.
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|value| !value.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = backend.parse()?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|value| !value.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(self)
    }

    /// Opens the configured blob store.
    pub fn open_store(&self) -> StoreResult<Box<dyn BlobStore>> {
        match self.backend {
            StoreBackend::File => Ok(Box::new(FileBlobStore::open(&self.data_dir)?)),
            StoreBackend::Sqlite => {
                fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
                    key: String::new(),
                    source,
                })?;
                Ok(Box::new(SqliteBlobStore::open(
                    self.data_dir.join(SQLITE_FILE_NAME),
                )?))
            }
        }
    }
}
