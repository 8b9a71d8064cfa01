use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercase hex rendering of a SHA-256 hash.
///
/// Deserializing goes through [`Digest::from_hex`], so a stored value that is
/// not 64 hex characters fails to load instead of posing as a digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    pub const HEX_LEN: usize = 64;

    /// Build a digest from the raw 32 hash bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse a hex string, accepting upper or lower case.
    /// Returns `None` unless it is exactly 64 hex characters.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != Self::HEX_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl TryFrom<String> for Digest {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Digest::from_hex(&value).ok_or_else(|| format!("not a SHA-256 hex digest: {value:?}"))
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest of the provisioned executable, tagged with the version it belongs to.
///
/// The digest is only meaningful while `version` equals the currently required
/// scanner version; a record for any other version counts as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDigest {
    pub version: String,
    pub digest: Digest,
}

impl VersionDigest {
    /// Key under which the record lives in the global state store.
    pub const STORAGE_KEY: &'static str = "requiredVersionDigest";

    pub fn new(version: impl Into<String>, digest: Digest) -> Self {
        Self {
            version: version.into(),
            digest,
        }
    }

    pub fn is_for(&self, required_version: &str) -> bool {
        self.version == required_version
    }
}
