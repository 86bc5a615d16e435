//! Encode/decode service for persisted and transported entities.
//!
//! # Responsibility
//! - Convert persisted `Site` records, access points included, to and from bytes.
//! - Keep the wire format out of repository logic.
//!
//! # Invariants
//! - `decode_site(encode_site(s)) == s` for every site.

use crate::model::site::Site;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CodecResult<T> = Result<T, CodecError>;

/// Encode or decode failure.
#[derive(Debug)]
pub struct CodecError(serde_json::Error);

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed site data: {}", self.0)
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self(value)
    }
}

/// Bidirectional codec for stored site records.
pub trait SiteCodec {
    fn encode_site(&self, site: &Site) -> CodecResult<Vec<u8>>;
    fn decode_site(&self, bytes: &[u8]) -> CodecResult<Site>;
}

/// JSON codec backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Compact single-line output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented output, easier to inspect in a data directory.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    fn encode<T: serde::Serialize>(&self, value: &T) -> CodecResult<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }
}

impl SiteCodec for JsonCodec {
    fn encode_site(&self, site: &Site) -> CodecResult<Vec<u8>> {
        self.encode(site)
    }

    fn decode_site(&self, bytes: &[u8]) -> CodecResult<Site> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
