//! Descriptor digests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use verso_error::{DescriptorError, DescriptorErrorKind};

/// Domain separator mixed into every digest so descriptor digests can never
/// collide with content checksums of the same bytes.
const DIGEST_DOMAIN: &[u8] = b"verso.descriptor.v1\n";

/// Fixed-length content hash of a canonical descriptor.
///
/// Rendered as 64 lowercase hex characters (SHA-256). Together with the
/// source id it is the whole identity of a variant.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(try_from = "String", into = "String")]
pub struct DescriptorDigest(String);

impl DescriptorDigest {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    /// Hash a canonical descriptor serialization.
    pub(crate) fn of_canonical(canonical: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DIGEST_DOMAIN);
        hasher.update(canonical.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Rebuild a digest read back from storage.
    ///
    /// Returns `None` unless `hex` is exactly 64 lowercase hex characters.
    pub fn from_hex(hex: impl Into<String>) -> Option<Self> {
        let hex = hex.into();
        let valid = hex.len() == Self::HEX_LEN
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then_some(Self(hex))
    }

    /// The hex rendering.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl TryFrom<String> for DescriptorDigest {
    type Error = DescriptorError;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Self::from_hex(hex.as_str()).ok_or_else(|| {
            DescriptorError::new(DescriptorErrorKind::InvalidValue {
                option: "descriptor_digest".to_string(),
                reason: format!("'{}' is not a {}-character lowercase hex digest", hex, Self::HEX_LEN),
            })
        })
    }
}

impl From<DescriptorDigest> for String {
    fn from(digest: DescriptorDigest) -> Self {
        digest.0
    }
}

impl AsRef<str> for DescriptorDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
