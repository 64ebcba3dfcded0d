//! Content digest of a feed.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Error returned when a digest string is not 64 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid feed digest: {reason}")]
pub struct InvalidDigest {
    reason: &'static str,
}

/// SHA-256 of the raw feed bytes.
///
/// Identical feed content always yields the same digest, which is what the
/// disk cache keys on. Serialized as a lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FeedDigest([u8; 32]);

impl FeedDigest {
    /// Digest a single byte buffer (e.g. a zip archive).
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Digest several buffers, each prefixed with its length, so bytes
    /// cannot move across a part boundary without changing the digest.
    pub fn of_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, InvalidDigest> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).map_err(|e| InvalidDigest {
            reason: match e {
                hex::FromHexError::InvalidHexCharacter { .. } => "must contain only hex digits",
                _ => "must be 64 hex characters",
            },
        })?;
        Ok(Self(out))
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FeedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FeedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "FeedDigest({}…)", &hex[..12])
    }
}

impl From<FeedDigest> for String {
    fn from(digest: FeedDigest) -> Self {
        digest.to_hex()
    }
}

impl TryFrom<String> for FeedDigest {
    type Error = InvalidDigest;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}
