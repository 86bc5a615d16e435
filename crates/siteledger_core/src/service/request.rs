//! Structured request handling over `SiteService`.
//!
//! # Responsibility
//! - Decode one operation request, run it, and encode the outcome.
//! - Map repository error kinds to response statuses.
//!
//! # Invariants
//! - Every request yields exactly one response; handling never panics.
//! - Error bodies are `{"error": <message>}`; delete bodies are
//!   `{"success": <message>}`.

use crate::model::site::{AccessPoint, Site};
use crate::repo::site_repo::{ErrorKind, RepoError, RepoResult, SiteRepository};
use crate::service::site_service::SiteService;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// One operation against the site store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SiteRequest {
    ListSites,
    GetSite {
        name: String,
    },
    CreateSite {
        site: Site,
    },
    EditSite {
        site: Site,
    },
    DeleteSite {
        name: String,
    },
    RenameSite {
        name: String,
        new_name: String,
    },
    ListAccessPoints {
        site: String,
    },
    GetAccessPoint {
        site: String,
        label: String,
    },
    UpsertAccessPoint {
        site: String,
        access_point: AccessPoint,
    },
    CreateAccessPoint {
        site: String,
        access_point: AccessPoint,
    },
    UpdateAccessPoint {
        site: String,
        access_point: AccessPoint,
    },
    DeleteAccessPoint {
        site: String,
        label: String,
    },
}

impl SiteRequest {
    /// Stable operation name, matching the `op` tag.
    pub fn op(&self) -> &'static str {
        match self {
            Self::ListSites => "list_sites",
            Self::GetSite { .. } => "get_site",
            Self::CreateSite { .. } => "create_site",
            Self::EditSite { .. } => "edit_site",
            Self::DeleteSite { .. } => "delete_site",
            Self::RenameSite { .. } => "rename_site",
            Self::ListAccessPoints { .. } => "list_access_points",
            Self::GetAccessPoint { .. } => "get_access_point",
            Self::UpsertAccessPoint { .. } => "upsert_access_point",
            Self::CreateAccessPoint { .. } => "create_access_point",
            Self::UpdateAccessPoint { .. } => "update_access_point",
            Self::DeleteAccessPoint { .. } => "delete_access_point",
        }
    }
}

/// Outcome of one request: an HTTP-style status plus a JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteResponse {
    pub status: u16,
    pub body: Value,
}

impl SiteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn success<T: Serialize>(status: u16, result: RepoResult<T>) -> Self {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(body) => Self { status, body },
                Err(err) => Self::error(STATUS_INTERNAL_ERROR, err.to_string()),
            },
            Err(err) => Self::from_repo_error(&err),
        }
    }

    fn deleted(result: RepoResult<()>, message: &str) -> Self {
        match result {
            Ok(()) => Self {
                status: STATUS_OK,
                body: json!({ "success": message }),
            },
            Err(err) => Self::from_repo_error(&err),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn from_repo_error(err: &RepoError) -> Self {
        Self::error(status_for_kind(err.kind()), err.to_string())
    }
}

/// Response status used for each error kind.
pub fn status_for_kind(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::NotFound => STATUS_NOT_FOUND,
        ErrorKind::AlreadyExists => STATUS_CONFLICT,
        ErrorKind::Validation => STATUS_BAD_REQUEST,
        ErrorKind::Io => STATUS_INTERNAL_ERROR,
    }
}

/// Runs one decoded request against the service.
pub fn handle<R: SiteRepository>(service: &SiteService<R>, request: &SiteRequest) -> SiteResponse {
    let response = match request {
        SiteRequest::ListSites => SiteResponse::success(STATUS_OK, service.list_sites()),
        SiteRequest::GetSite { name } => SiteResponse::success(STATUS_OK, service.get_site(name)),
        SiteRequest::CreateSite { site } => {
            SiteResponse::success(STATUS_CREATED, service.create_site(site))
        }
        SiteRequest::EditSite { site } => {
            SiteResponse::success(STATUS_CREATED, service.edit_site(site))
        }
        SiteRequest::DeleteSite { name } => {
            SiteResponse::deleted(service.delete_site(name), "Site Deleted")
        }
        SiteRequest::RenameSite { name, new_name } => {
            SiteResponse::success(STATUS_CREATED, service.rename_site(name, new_name))
        }
        SiteRequest::ListAccessPoints { site } => {
            SiteResponse::success(STATUS_OK, service.list_access_points(site))
        }
        SiteRequest::GetAccessPoint { site, label } => {
            SiteResponse::success(STATUS_OK, service.get_access_point(site, label))
        }
        SiteRequest::UpsertAccessPoint { site, access_point } => SiteResponse::success(
            STATUS_CREATED,
            service.upsert_access_point(site, access_point),
        ),
        SiteRequest::CreateAccessPoint { site, access_point } => SiteResponse::success(
            STATUS_CREATED,
            service.create_access_point(site, access_point),
        ),
        SiteRequest::UpdateAccessPoint { site, access_point } => SiteResponse::success(
            STATUS_CREATED,
            service.update_access_point(site, access_point),
        ),
        SiteRequest::DeleteAccessPoint { site, label } => SiteResponse::deleted(
            service.delete_access_point(site, label),
            "Access Point Deleted",
        ),
    };

    debug!(
        "event=request_handled module=service op={} status={}",
        request.op(),
        response.status
    );
    response
}

/// Decodes a JSON request and runs it; malformed input is a 400.
pub fn handle_json<R: SiteRepository>(service: &SiteService<R>, input: &[u8]) -> SiteResponse {
    match serde_json::from_slice::<SiteRequest>(input) {
        Ok(request) => handle(service, &request),
        Err(err) => SiteResponse::error(STATUS_BAD_REQUEST, format!("invalid request: {err}")),
    }
}
