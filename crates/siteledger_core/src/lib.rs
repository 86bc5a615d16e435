//! Core domain logic for SiteLedger.
//! Sites and their access points, validated and persisted one record per site.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use codec::{CodecError, JsonCodec, SiteCodec};
pub use config::{ConfigError, CoreConfig, StoreBackend};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::site::{validate_site_name, AccessPoint, Site, SiteValidationError};
pub use repo::site_locks::SiteLocks;
pub use repo::site_repo::{BlobSiteRepository, ErrorKind, RepoError, RepoResult, SiteRepository};
pub use service::request::{handle, handle_json, SiteRequest, SiteResponse};
pub use service::site_service::SiteService;
pub use store::{BlobStore, FileBlobStore, SqliteBlobStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
