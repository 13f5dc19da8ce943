//! Content fingerprints.
//!
//! Local files carry the MD5 of their content twice: lowercase hex (compared
//! against remote ETags) and base64 (sent as `Content-MD5`). Remote ETags come
//! wrapped in quotes and must go through [`normalize_etag`] before they are
//! comparable.

use base64::Engine;
use md5::{Digest, Md5};

/// Both encodings of a content MD5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Lowercase hex, 32 characters.
    pub hash16: String,
    /// Standard base64 with padding, 24 characters.
    pub hash64: String,
}

impl Fingerprint {
    pub fn of(content: &[u8]) -> Self {
        let digest = Md5::digest(content);
        Self {
            hash16: hex::encode(digest.as_slice()),
            hash64: base64::engine::general_purpose::STANDARD.encode(digest.as_slice()),
        }
    }
}

/// Strip the quoting a listing puts around an ETag.
///
/// `"abc"` and `W/"abc"` both become `abc`; an unquoted value is returned
/// trimmed but otherwise unchanged.
pub fn normalize_etag(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unweak = trimmed.strip_prefix("W/").unwrap_or(trimmed);
    unweak
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}
