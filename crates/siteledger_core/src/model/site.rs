//! Site domain model.
//!
//! # Responsibility
//! - Define the `Site` record and its owned `AccessPoint` entries.
//! - Enforce naming and label-uniqueness rules before persistence.
//!
//! # Invariants
//! - `name` matches `^[a-z]+$`; it doubles as the storage key.
//! - Access point labels are unique within one site.
//! - `role`, `uri` and `url` are free-form and never validated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static SITE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]+$").expect("valid site name regex"));

/// Labeled endpoint owned by exactly one site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    /// Unique within the owning site.
    #[serde(alias = "Label", default)]
    pub label: String,
    #[serde(alias = "Url", default)]
    pub url: String,
}

impl AccessPoint {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Top-level named record persisted as one storage entry.
///
/// Decoding accepts the capitalized field names written by older
/// deployments, and treats a `null` access point list as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Storage key. Lowercase ASCII letters only.
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Role", default)]
    pub role: String,
    #[serde(alias = "Uri", default)]
    pub uri: String,
    /// Ordered; insertion order is preserved across upserts.
    #[serde(
        alias = "Access_points",
        default,
        deserialize_with = "deserialize_access_points"
    )]
    pub access_points: Vec<AccessPoint>,
}

/// Validation failures for `Site` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteValidationError {
    /// Name is empty or contains characters outside `a-z`.
    InvalidName(String),
    /// Two access points share the same label.
    DuplicateLabel(String),
}

impl Display for SiteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(
                f,
                "site name `{name}` is invalid; it can only contain lowercase letters"
            ),
            Self::DuplicateLabel(label) => {
                write!(f, "access point label `{label}` is used more than once")
            }
        }
    }
}

impl Error for SiteValidationError {}

impl Site {
    /// Creates a site without access points.
    pub fn new(name: impl Into<String>, role: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            uri: uri.into(),
            access_points: Vec::new(),
        }
    }

    /// Builder-style helper that appends one access point.
    pub fn with_access_point(mut self, access_point: AccessPoint) -> Self {
        self.access_points.push(access_point);
        self
    }

    /// Checks name format and access point label uniqueness.
    ///
    /// # Errors
    /// - `InvalidName` when `name` is empty or not all lowercase `a-z`.
    /// - `DuplicateLabel` for the first label seen twice, in sequence order.
    pub fn validate(&self) -> Result<(), SiteValidationError> {
        validate_site_name(&self.name)?;

        let mut seen = HashSet::with_capacity(self.access_points.len());
        for access_point in &self.access_points {
            if !seen.insert(access_point.label.as_str()) {
                return Err(SiteValidationError::DuplicateLabel(
                    access_point.label.clone(),
                ));
            }
        }

        Ok(())
    }

    /// Compares every field except the access point sequence.
    pub fn eq_ignoring_access_points(&self, other: &Site) -> bool {
        self.name == other.name && self.role == other.role && self.uri == other.uri
    }

    /// Returns the access point with `label`, if any.
    pub fn access_point(&self, label: &str) -> Option<&AccessPoint> {
        self.access_points
            .iter()
            .find(|access_point| access_point.label == label)
    }

    /// Returns the sequence index of the access point with `label`.
    pub fn access_point_position(&self, label: &str) -> Option<usize> {
        self.access_points
            .iter()
            .position(|access_point| access_point.label == label)
    }
}

/// Checks a candidate site name against `^[a-z]+$`.
pub fn validate_site_name(name: &str) -> Result<(), SiteValidationError> {
    if SITE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(SiteValidationError::InvalidName(name.to_string()))
    }
}

fn deserialize_access_points<'de, D>(deserializer: D) -> Result<Vec<AccessPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AccessPoint>>::deserialize(deserializer)?.unwrap_or_default())
}
