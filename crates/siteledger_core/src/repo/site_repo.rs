//! Site repository contracts and blob-store implementation.
//!
//! # Responsibility
//! - Provide site CRUD and access point sub-operations over any `BlobStore`.
//! - Own the merge rules for partial updates.
//!
//! # Invariants
//! - Every mutation rewrites the whole site record; there are no partial writes.
//! - `edit_site` never changes the stored access point sequence.
//! - Access point upserts replace in place and never duplicate a label.
//! - Load-merge-store sequences for one site name are serialized in-process.

use crate::codec::{CodecError, JsonCodec, SiteCodec};
use crate::model::site::{AccessPoint, Site, SiteValidationError};
use crate::repo::site_locks::SiteLocks;
use crate::store::{BlobStore, StoreError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse error classification for callers that map errors to statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Validation,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Validation => "validation",
            Self::Io => "io",
        }
    }
}

/// Repository error for site persistence operations.
#[derive(Debug)]
pub enum RepoError {
    SiteNotFound(String),
    AccessPointNotFound { site: String, label: String },
    SiteAlreadyExists(String),
    AccessPointAlreadyExists { site: String, label: String },
    Validation(SiteValidationError),
    Store(StoreError),
    Codec(CodecError),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SiteNotFound(_) | Self::AccessPointNotFound { .. } => ErrorKind::NotFound,
            Self::SiteAlreadyExists(_) | Self::AccessPointAlreadyExists { .. } => {
                ErrorKind::AlreadyExists
            }
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(_) | Self::Codec(_) => ErrorKind::Io,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SiteNotFound(name) => write!(f, "site does not exist: {name}"),
            Self::AccessPointNotFound { site, label } => {
                write!(f, "access point `{label}` does not exist in site {site}")
            }
            Self::SiteAlreadyExists(name) => write!(f, "a site already exists with name {name}"),
            Self::AccessPointAlreadyExists { site, label } => {
                write!(f, "access point `{label}` already exists in site {site}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SiteValidationError> for RepoError {
    fn from(value: SiteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(key) => Self::SiteNotFound(key),
            other => Self::Store(other),
        }
    }
}

impl From<CodecError> for RepoError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Repository interface for sites and their access points.
pub trait SiteRepository {
    /// Persists a new site verbatim, including supplied access points.
    fn create_site(&self, site: &Site) -> RepoResult<Site>;
    fn get_site(&self, name: &str) -> RepoResult<Site>;
    /// Loads every stored site; one undecodable record fails the whole call.
    fn list_sites(&self) -> RepoResult<Vec<Site>>;
    /// Replaces `role`/`uri`, keeping the stored access points.
    fn edit_site(&self, site: &Site) -> RepoResult<Site>;
    fn delete_site(&self, name: &str) -> RepoResult<()>;
    /// Moves a site to a new storage key, keeping all other fields.
    fn rename_site(&self, name: &str, new_name: &str) -> RepoResult<Site>;

    fn list_access_points(&self, site_name: &str) -> RepoResult<Vec<AccessPoint>>;
    fn get_access_point(&self, site_name: &str, label: &str) -> RepoResult<AccessPoint>;
    /// Replaces the url of a matching label in place, or appends.
    fn upsert_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint>;
    fn create_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint>;
    fn update_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint>;
    fn delete_access_point(&self, site_name: &str, label: &str) -> RepoResult<()>;
}

/// Site repository over an injected blob store and codec.
pub struct BlobSiteRepository<S: BlobStore, C: SiteCodec = JsonCodec> {
    store: S,
    codec: C,
    locks: SiteLocks,
}

impl<S: BlobStore> BlobSiteRepository<S, JsonCodec> {
    /// Uses compact JSON records.
    pub fn new(store: S) -> Self {
        Self::with_codec(store, JsonCodec::new())
    }
}

impl<S: BlobStore, C: SiteCodec> BlobSiteRepository<S, C> {
    pub fn with_codec(store: S, codec: C) -> Self {
        Self {
            store,
            codec,
            locks: SiteLocks::new(),
        }
    }

    /// Underlying store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_site(&self, key: &str) -> RepoResult<Site> {
        let bytes = self.store.load(key)?;
        Ok(self.codec.decode_site(&bytes)?)
    }

    fn write_site(&self, key: &str, site: &Site) -> RepoResult<()> {
        let bytes = self.codec.encode_site(site)?;
        self.store.write(key, &bytes)?;
        Ok(())
    }

    /// Runs one load-mutate-store cycle on the site stored under `site_name`.
    fn modify_site<T>(
        &self,
        site_name: &str,
        mutate: impl FnOnce(&mut Site) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let _guard = self.locks.lock(site_name);
        let mut site = self.load_site(site_name)?;
        let output = mutate(&mut site)?;
        self.write_site(site_name, &site)?;
        Ok(output)
    }
}

impl<S: BlobStore, C: SiteCodec> SiteRepository for BlobSiteRepository<S, C> {
    fn create_site(&self, site: &Site) -> RepoResult<Site> {
        let _guard = self.locks.lock(&site.name);
        if self.store.exists(&site.name)? {
            return Err(RepoError::SiteAlreadyExists(site.name.clone()));
        }
        site.validate()?;
        self.write_site(&site.name, site)?;

        info!(
            "event=site_create module=repo status=ok site={} access_points={}",
            site.name,
            site.access_points.len()
        );
        Ok(site.clone())
    }

    fn get_site(&self, name: &str) -> RepoResult<Site> {
        self.load_site(name)
    }

    fn list_sites(&self) -> RepoResult<Vec<Site>> {
        self.store
            .list_keys()?
            .iter()
            .map(|key| self.load_site(key))
            .collect()
    }

    fn edit_site(&self, site: &Site) -> RepoResult<Site> {
        let _guard = self.locks.lock(&site.name);
        let stored = self.load_site(&site.name)?;

        let merged = Site {
            access_points: stored.access_points,
            ..site.clone()
        };
        merged.validate()?;
        self.write_site(&merged.name, &merged)?;

        info!("event=site_edit module=repo status=ok site={}", merged.name);
        Ok(merged)
    }

    fn delete_site(&self, name: &str) -> RepoResult<()> {
        let _guard = self.locks.lock(name);
        if !self.store.exists(name)? {
            return Err(RepoError::SiteNotFound(name.to_string()));
        }
        self.store.delete(name)?;

        info!("event=site_delete module=repo status=ok site={name}");
        Ok(())
    }

    fn rename_site(&self, name: &str, new_name: &str) -> RepoResult<Site> {
        if name == new_name {
            return self.get_site(name);
        }

        let _guard = self.locks.lock_all(&[name, new_name]);
        let stored = self.load_site(name)?;
        if self.store.exists(new_name)? {
            return Err(RepoError::SiteAlreadyExists(new_name.to_string()));
        }

        let renamed = Site {
            name: new_name.to_string(),
            ..stored
        };
        renamed.validate()?;
        self.write_site(new_name, &renamed)?;
        if let Err(err) = self.store.delete(name) {
            // Keep exactly one copy: drop the record just written.
            if let Err(rollback) = self.store.delete(new_name) {
                error!(
                    "event=site_rename module=repo status=error site={name} new_site={new_name} error_code=rollback_failed error={rollback}"
                );
            }
            return Err(err.into());
        }

        info!("event=site_rename module=repo status=ok site={name} new_site={new_name}");
        Ok(renamed)
    }

    fn list_access_points(&self, site_name: &str) -> RepoResult<Vec<AccessPoint>> {
        Ok(self.load_site(site_name)?.access_points)
    }

    fn get_access_point(&self, site_name: &str, label: &str) -> RepoResult<AccessPoint> {
        self.load_site(site_name)?
            .access_point(label)
            .cloned()
            .ok_or_else(|| RepoError::AccessPointNotFound {
                site: site_name.to_string(),
                label: label.to_string(),
            })
    }

    fn upsert_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint> {
        let replaced = self.modify_site(site_name, |site| {
            Ok(match site.access_point_position(&ap.label) {
                Some(index) => {
                    site.access_points[index].url = ap.url.clone();
                    true
                }
                None => {
                    site.access_points.push(ap.clone());
                    false
                }
            })
        })?;

        info!(
            "event=access_point_upsert module=repo status=ok site={} label={} replaced={}",
            site_name, ap.label, replaced
        );
        Ok(ap.clone())
    }

    fn create_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint> {
        self.modify_site(site_name, |site| {
            if site.access_point(&ap.label).is_some() {
                return Err(RepoError::AccessPointAlreadyExists {
                    site: site_name.to_string(),
                    label: ap.label.clone(),
                });
            }
            site.access_points.push(ap.clone());
            Ok(())
        })?;

        info!(
            "event=access_point_create module=repo status=ok site={} label={}",
            site_name, ap.label
        );
        Ok(ap.clone())
    }

    fn update_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint> {
        self.modify_site(site_name, |site| {
            let index = site.access_point_position(&ap.label).ok_or_else(|| {
                RepoError::AccessPointNotFound {
                    site: site_name.to_string(),
                    label: ap.label.clone(),
                }
            })?;
            site.access_points[index].url = ap.url.clone();
            Ok(())
        })?;

        info!(
            "event=access_point_update module=repo status=ok site={} label={}",
            site_name, ap.label
        );
        Ok(ap.clone())
    }

    fn delete_access_point(&self, site_name: &str, label: &str) -> RepoResult<()> {
        self.modify_site(site_name, |site| {
            let index = site.access_point_position(label).ok_or_else(|| {
                RepoError::AccessPointNotFound {
                    site: site_name.to_string(),
                    label: label.to_string(),
                }
            })?;
            site.access_points.remove(index);
            Ok(())
        })?;

        info!("event=access_point_delete module=repo status=ok site={site_name} label={label}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BlobSiteRepository, ErrorKind, RepoError, SiteRepository};
    use crate::codec::CodecError;
    use crate::model::site::{AccessPoint, Site, SiteValidationError};
    use crate::store::{BlobStore, SqliteBlobStore, StoreError, StoreResult};

    fn repo() -> BlobSiteRepository<SqliteBlobStore> {
        BlobSiteRepository::new(SqliteBlobStore::open_in_memory().unwrap())
    }

    #[test]
    fn error_kinds_cover_every_variant() {
        let codec_err = CodecError::from(serde_json::from_str::<Site>("{").unwrap_err());
        let cases = [
            (RepoError::SiteNotFound("a".into()), ErrorKind::NotFound),
            (
                RepoError::AccessPointNotFound {
                    site: "a".into(),
                    label: "l".into(),
                },
                ErrorKind::NotFound,
            ),
            (RepoError::SiteAlreadyExists("a".into()), ErrorKind::AlreadyExists),
            (
                RepoError::AccessPointAlreadyExists {
                    site: "a".into(),
                    label: "l".into(),
                },
                ErrorKind::AlreadyExists,
            ),
            (
                RepoError::Validation(SiteValidationError::InvalidName("A".into())),
                ErrorKind::Validation,
            ),
            (RepoError::Store(StoreError::Poisoned), ErrorKind::Io),
            (RepoError::Codec(codec_err), ErrorKind::Io),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn store_not_found_maps_to_site_not_found() {
        let err = RepoError::from(StoreError::NotFound("acme".into()));
        assert!(matches!(err, RepoError::SiteNotFound(name) if name == "acme"));
    }

    #[test]
    fn upsert_on_missing_site_is_not_found() {
        let err = repo()
            .upsert_access_point("ghost", &AccessPoint::new("api", "u"))
            .unwrap_err();
        assert!(matches!(err, RepoError::SiteNotFound(name) if name == "ghost"));
    }

    #[test]
    fn failed_strict_create_leaves_record_untouched() {
        let repo = repo();
        let site = Site::new("acme", "", "").with_access_point(AccessPoint::new("api", "a"));
        repo.create_site(&site).unwrap();

        let err = repo
            .create_access_point("acme", &AccessPoint::new("api", "b"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(repo.get_site("acme").unwrap(), site);
    }

    /// Delegates to SQLite but refuses to delete one key.
    struct StickyStore {
        inner: SqliteBlobStore,
        sticky: &'static str,
    }

    impl BlobStore for StickyStore {
        fn exists(&self, key: &str) -> StoreResult<bool> {
            self.inner.exists(key)
        }

        fn load(&self, key: &str) -> StoreResult<Vec<u8>> {
            self.inner.load(key)
        }

        fn write(&self, key: &str, data: &[u8]) -> StoreResult<()> {
            self.inner.write(key, data)
        }

        fn delete(&self, key: &str) -> StoreResult<()> {
            if key == self.sticky {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            self.inner.delete(key)
        }

        fn list_keys(&self) -> StoreResult<Vec<String>> {
            self.inner.list_keys()
        }
    }

    #[test]
    fn rename_removes_new_record_when_old_cannot_be_deleted() {
        let repo = BlobSiteRepository::new(StickyStore {
            inner: SqliteBlobStore::open_in_memory().unwrap(),
            sticky: "acme",
        });
        let site = Site::new("acme", "x", "y").with_access_point(AccessPoint::new("api", "u"));
        repo.create_site(&site).unwrap();

        let err = repo.rename_site("acme", "globex").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(repo.store().list_keys().unwrap(), vec!["acme"]);
        assert_eq!(repo.get_site("acme").unwrap(), site);
    }

    #[test]
    fn rename_to_same_name_returns_stored_site() {
        let repo = repo();
        let site = Site::new("acme", "x", "y");
        repo.create_site(&site).unwrap();

        assert_eq!(repo.rename_site("acme", "acme").unwrap(), site);
    }
}
