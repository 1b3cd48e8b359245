use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bytes in a CometBFT validator address.
pub const VALIDATOR_ADDRESS_LEN: usize = 20;

/// Number of bytes in an Ed25519 public key.
pub const ED25519_PUBKEY_LEN: usize = 32;

/// Number of bytes in an Ed25519 signature.
pub const ED25519_SIGNATURE_LEN: usize = 64;

/// A validator address: the first 20 bytes of SHA256(pubkey).
/// Displayed as upper-case hex, the way CometBFT prints it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValidatorAddress(pub [u8; VALIDATOR_ADDRESS_LEN]);

impl ValidatorAddress {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let arr: [u8; VALIDATOR_ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            format!(
                "Validator address must be {} bytes, got {}",
                VALIDATOR_ADDRESS_LEN,
                bytes.len()
            )
        })?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self, String> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| format!("Invalid validator address hex: {}", e))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for ValidatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for ValidatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorAddress({})", self)
    }
}

impl Serialize for ValidatorAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ValidatorAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// An Ed25519 public key as carried by validator sets and participant records.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ed25519PublicKey(pub [u8; ED25519_PUBKEY_LEN]);

impl Ed25519PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let arr: [u8; ED25519_PUBKEY_LEN] = bytes.try_into().map_err(|_| {
            format!(
                "Ed25519 public key must be {} bytes, got {}",
                ED25519_PUBKEY_LEN,
                bytes.len()
            )
        })?;
        Ok(Self(arr))
    }

    /// Parse the standard-base64 form used in JSON responses.
    pub fn from_base64(s: &str) -> Result<Self, String> {
        use base64::Engine as _;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s.trim())
            .map_err(|e| format!("Invalid base64 public key: {}", e))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_base64(&self) -> String {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }

    /// The CometBFT address of this key: SHA256(pubkey)[..20].
    pub fn address(&self) -> ValidatorAddress {
        let digest = crate::proof::ics23::sha256(&self.0);
        let mut addr = [0u8; VALIDATOR_ADDRESS_LEN];
        addr.copy_from_slice(&digest[..VALIDATOR_ADDRESS_LEN]);
        ValidatorAddress(addr)
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey({})", self.to_base64())
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// A protobuf `google.protobuf.Timestamp`: seconds since the Unix epoch plus nanos.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    /// Go's zero `time.Time` (0001-01-01T00:00:00Z), which absent votes carry.
    pub const GO_ZERO: Timestamp = Timestamp {
        seconds: -62_135_596_800,
        nanos: 0,
    };
}

/// Header of the part set a block was gossiped in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSetHeader {
    pub total: u32,
    pub hash: Vec<u8>,
}

/// Identifies a block: header hash plus part-set header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockId {
    pub hash: Vec<u8>,
    pub part_set_header: PartSetHeader,
}

impl BlockId {
    /// A zero block id is what a nil precommit signs.
    pub fn is_zero(&self) -> bool {
        self.hash.is_empty()
            && self.part_set_header.total == 0
            && self.part_set_header.hash.is_empty()
    }
}

/// How a validator took part in a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockIdFlag {
    /// No vote received; carries no signature.
    Absent,
    /// Voted for the committed block.
    Commit,
    /// Voted nil.
    Nil,
}

impl BlockIdFlag {
    pub fn from_i32(value: i32) -> Result<Self, String> {
        match value {
            1 => Ok(BlockIdFlag::Absent),
            2 => Ok(BlockIdFlag::Commit),
            3 => Ok(BlockIdFlag::Nil),
            other => Err(format!("Unknown block id flag {}", other)),
        }
    }
}

/// One validator's entry in a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSig {
    pub block_id_flag: BlockIdFlag,
    pub validator_address: Option<ValidatorAddress>,
    pub timestamp: Timestamp,
    pub signature: Vec<u8>,
}

/// The precommits that finalized a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub height: u64,
    pub round: i32,
    pub block_id: BlockId,
    pub signatures: Vec<CommitSig>,
}

/// Block and app protocol versions a header was produced under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusVersion {
    pub block: u64,
    pub app: u64,
}

/// A CometBFT block header. Every field feeds the header hash, so a partial
/// header (as the participants endpoint returns) cannot be hashed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: ConsensusVersion,
    pub chain_id: String,
    pub height: u64,
    pub time: Timestamp,
    pub last_block_id: BlockId,
    pub last_commit_hash: Vec<u8>,
    pub data_hash: Vec<u8>,
    pub validators_hash: Vec<u8>,
    pub next_validators_hash: Vec<u8>,
    pub consensus_hash: Vec<u8>,
    /// Application state root after the previous block; the trust root for proofs.
    pub app_hash: Vec<u8>,
    pub last_results_hash: Vec<u8>,
    pub evidence_hash: Vec<u8>,
    pub proposer_address: Vec<u8>,
}

/// A block as far as the custody walk needs it: header and the commit it
/// carries. `last_commit` finalizes the *previous* height, not this header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub last_commit: Commit,
}

/// One member of a CometBFT validator set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: ValidatorAddress,
    pub pub_key: Ed25519PublicKey,
    pub voting_power: u64,
}
