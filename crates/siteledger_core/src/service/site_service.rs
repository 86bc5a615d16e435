//! Site use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for CLI and request-handling callers.
//! - Delegate persistence and merge rules to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Every failed call is logged once with its error kind.

use crate::model::site::{AccessPoint, Site};
use crate::repo::site_repo::{RepoResult, SiteRepository};
use log::warn;

/// Use-case service wrapper for site and access point operations.
pub struct SiteService<R: SiteRepository> {
    repo: R,
}

impl<R: SiteRepository> SiteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn create_site(&self, site: &Site) -> RepoResult<Site> {
        observe("site_create", &site.name, self.repo.create_site(site))
    }

    pub fn get_site(&self, name: &str) -> RepoResult<Site> {
        observe("site_get", name, self.repo.get_site(name))
    }

    pub fn list_sites(&self) -> RepoResult<Vec<Site>> {
        observe("site_list", "*", self.repo.list_sites())
    }

    /// Updates `role`/`uri`; stored access points always win over the input.
    pub fn edit_site(&self, site: &Site) -> RepoResult<Site> {
        observe("site_edit", &site.name, self.repo.edit_site(site))
    }

    pub fn delete_site(&self, name: &str) -> RepoResult<()> {
        observe("site_delete", name, self.repo.delete_site(name))
    }

    pub fn rename_site(&self, name: &str, new_name: &str) -> RepoResult<Site> {
        observe("site_rename", name, self.repo.rename_site(name, new_name))
    }

    pub fn list_access_points(&self, site_name: &str) -> RepoResult<Vec<AccessPoint>> {
        observe(
            "access_point_list",
            site_name,
            self.repo.list_access_points(site_name),
        )
    }

    pub fn get_access_point(&self, site_name: &str, label: &str) -> RepoResult<AccessPoint> {
        observe(
            "access_point_get",
            site_name,
            self.repo.get_access_point(site_name, label),
        )
    }

    pub fn upsert_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint> {
        observe(
            "access_point_upsert",
            site_name,
            self.repo.upsert_access_point(site_name, ap),
        )
    }

    pub fn create_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint> {
        observe(
            "access_point_create",
            site_name,
            self.repo.create_access_point(site_name, ap),
        )
    }

    pub fn update_access_point(&self, site_name: &str, ap: &AccessPoint) -> RepoResult<AccessPoint> {
        observe(
            "access_point_update",
            site_name,
            self.repo.update_access_point(site_name, ap),
        )
    }

    pub fn delete_access_point(&self, site_name: &str, label: &str) -> RepoResult<()> {
        observe(
            "access_point_delete",
            site_name,
            self.repo.delete_access_point(site_name, label),
        )
    }
}

fn observe<T>(event: &str, site: &str, result: RepoResult<T>) -> RepoResult<T> {
    if let Err(err) = &result {
        warn!(
            "event={} module=service status=error site={} error_kind={} error={}",
            event,
            site,
            err.kind().as_str(),
            err
        );
    }
    result
}
