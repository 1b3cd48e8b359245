use crate::error::VerifyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An app hash trusted out of band, typically the genesis app hash.
/// The custody walk succeeds only when it reaches a block carrying it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrustAnchor(pub [u8; 32]);

impl TrustAnchor {
    pub fn matches(&self, app_hash: &[u8]) -> bool {
        self.0.as_slice() == app_hash
    }
}

/// Parse a hex-encoded anchor hash, with or without `0x`.
pub fn parse_anchor_hash(hex_str: &str) -> Result<TrustAnchor, VerifyError> {
    let hex_str = hex_str.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);

    if hex_str.is_empty() {
        return Err(VerifyError::InvalidInput {
            reason: "anchor hash is empty".into(),
        });
    }
    if hex_str.len() != 64 {
        return Err(VerifyError::InvalidInput {
            reason: format!("anchor hash: expected 64 hex characters, got {}", hex_str.len()),
        });
    }

    let bytes = hex::decode(hex_str).map_err(|e| VerifyError::InvalidInput {
        reason: format!("anchor hash: invalid hex: {}", e),
    })?;

    let mut result = [0u8; 32];
    result.copy_from_slice(&bytes);
    Ok(TrustAnchor(result))
}

impl FromStr for TrustAnchor {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_anchor_hash(s)
    }
}

impl fmt::Display for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrustAnchor({})", self)
    }
}

impl Serialize for TrustAnchor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TrustAnchor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_anchor_hash(&s).map_err(serde::de::Error::custom)
    }
}
