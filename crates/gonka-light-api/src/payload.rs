//! Gonka REST / CometBFT RPC JSON adapter.
//!
//! The participants endpoint and the chain RPC speak JSON shapes that differ
//! from gonka-light-core's types. This module defines serde types matching
//! those shapes and converts them.
//!
//! Key differences:
//! - Heights and voting power may be JSON numbers or decimal strings
//! - Hashes are hex (upper or lower case), proof ops and signatures are base64
//! - Public keys are either a bare base64 string or `{ type, value }`
//! - Vote timestamps are RFC 3339 with nanoseconds
//! - RPC responses are wrapped in `{ result: {...} }`

use base64::Engine as _;
use chrono::DateTime;
use gonka_light_core::{
    ActiveParticipantSet, Block, BlockHeader, BlockId, BlockIdFlag, Commit, CommitSig,
    ConsensusVersion, Ed25519PublicKey, FetchError, ParticipantsWithProof, PartSetHeader, ProofOp,
    Timestamp, Validator, ValidatorAddress,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    Missing(&'static str),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl PayloadError {
    fn invalid(field: &'static str) -> impl FnOnce(String) -> PayloadError {
        move |reason| PayloadError::Invalid { field, reason }
    }
}

/// A body that is not the JSON we expect may be a proxy error page and is
/// worth retrying. A field that parsed but does not decode is what the server
/// actually sent, so it is not.
impl From<PayloadError> for FetchError {
    fn from(e: PayloadError) -> Self {
        match &e {
            PayloadError::Invalid { field, .. } if field.starts_with("proof_ops") => {
                FetchError::MalformedProof(e.to_string())
            }
            PayloadError::Invalid { .. } => FetchError::Malformed(e.to_string()),
            PayloadError::Json(_) | PayloadError::Missing(_) => FetchError::Decode(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| format!("hex decode: {}", e))
}

pub fn base64_to_bytes(s: &str) -> Result<Vec<u8>, String> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| format!("base64 decode: {}", e))
}

/// Parse an RFC 3339 timestamp into protobuf seconds + nanos.
pub fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    let dt = DateTime::parse_from_rfc3339(s).map_err(|e| format!("timestamp {:?}: {}", s, e))?;
    Ok(Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    })
}

/// A JSON integer that may also arrive as a decimal string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiNumber {
    Num(i64),
    Str(String),
}

impl ApiNumber {
    fn zero() -> Self {
        ApiNumber::Num(0)
    }

    pub fn as_i64(&self) -> Result<i64, String> {
        match self {
            ApiNumber::Num(n) => Ok(*n),
            ApiNumber::Str(s) => s.parse::<i64>().map_err(|e| format!("parse {:?}: {}", s, e)),
        }
    }

    pub fn as_u64(&self) -> Result<u64, String> {
        let n = self.as_i64()?;
        u64::try_from(n).map_err(|_| format!("expected non-negative value, got {}", n))
    }
}

// ---------------------------------------------------------------------------
// GET v1/epochs/{epoch}/participants
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct ApiParticipantsResponse {
    /// JSON mirror of the participant set. Not covered by the proof.
    pub active_participants: Option<ActiveParticipantSet>,
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Hex of the protobuf bytes the proof covers.
    #[serde(default)]
    pub active_participants_bytes: String,
    pub proof_ops: Option<ApiProofOps>,
    pub validators: Option<Vec<ApiValidator>>,
    pub block: Option<ApiBlock>,
    #[serde(default)]
    pub excluded_participants: Vec<serde_json::Value>,
}

impl ApiParticipantsResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn participants_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        if self.active_participants_bytes.is_empty() {
            return Err(PayloadError::Missing("active_participants_bytes"));
        }
        hex_to_bytes(&self.active_participants_bytes)
            .map_err(PayloadError::invalid("active_participants_bytes"))
    }

    pub fn proof_ops(&self) -> Result<Vec<ProofOp>, PayloadError> {
        match &self.proof_ops {
            Some(ops) => ops.to_core(),
            None => Ok(Vec::new()),
        }
    }

    /// The app hash the proof is against: `block.header.app_hash`, or a flat
    /// `block.app_hash` as some gateways return.
    pub fn app_hash(&self) -> Result<Vec<u8>, PayloadError> {
        self.block
            .as_ref()
            .ok_or(PayloadError::Missing("block"))?
            .app_hash()
    }

    pub fn to_core(&self) -> Result<ParticipantsWithProof, PayloadError> {
        let block = self.block.as_ref().ok_or(PayloadError::Missing("block"))?;
        let validators = match &self.validators {
            Some(list) => Some(
                list.iter()
                    .map(ApiValidator::to_core)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        Ok(ParticipantsWithProof {
            participants_bytes: self.participants_bytes()?,
            proof_ops: self.proof_ops()?,
            header: block.header()?,
            validators,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiProofOps {
    #[serde(default)]
    pub ops: Vec<ApiProofOp>,
}

impl ApiProofOps {
    pub fn to_core(&self) -> Result<Vec<ProofOp>, PayloadError> {
        self.ops.iter().map(ApiProofOp::to_core).collect()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiProofOp {
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub data: String,
}

impl ApiProofOp {
    pub fn to_core(&self) -> Result<ProofOp, PayloadError> {
        Ok(ProofOp {
            op_type: self.op_type.clone(),
            key: base64_to_bytes(&self.key).map_err(PayloadError::invalid("proof_ops.key"))?,
            data: base64_to_bytes(&self.data).map_err(PayloadError::invalid("proof_ops.data"))?,
        })
    }
}

// ---------------------------------------------------------------------------
// CometBFT block
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct ApiBlock {
    pub header: Option<ApiHeader>,
    pub app_hash: Option<String>,
    pub last_commit: Option<ApiCommit>,
}

/// A CometBFT header. The participants endpoint echoes only a few fields;
/// the `block` RPC returns all of them, and all are needed to hash it.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiHeader {
    pub version: Option<ApiVersion>,
    #[serde(default)]
    pub chain_id: String,
    pub height: ApiNumber,
    pub time: Option<String>,
    pub last_block_id: Option<ApiBlockId>,
    #[serde(default)]
    pub last_commit_hash: String,
    #[serde(default)]
    pub data_hash: String,
    #[serde(default)]
    pub validators_hash: String,
    #[serde(default)]
    pub next_validators_hash: String,
    #[serde(default)]
    pub consensus_hash: String,
    #[serde(default)]
    pub app_hash: String,
    #[serde(default)]
    pub last_results_hash: String,
    #[serde(default)]
    pub evidence_hash: String,
    #[serde(default)]
    pub proposer_address: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiVersion {
    pub block: ApiNumber,
    #[serde(default = "ApiNumber::zero")]
    pub app: ApiNumber,
}

fn header_hash_field(value: &str, field: &'static str) -> Result<Vec<u8>, PayloadError> {
    hex_to_bytes(value).map_err(PayloadError::invalid(field))
}

impl ApiBlock {
    pub fn app_hash(&self) -> Result<Vec<u8>, PayloadError> {
        let hex_str = self
            .header
            .as_ref()
            .map(|h| h.app_hash.as_str())
            .filter(|s| !s.is_empty())
            .or(self.app_hash.as_deref())
            .ok_or(PayloadError::Missing("block.header.app_hash"))?;
        hex_to_bytes(hex_str).map_err(PayloadError::invalid("app_hash"))
    }

    pub fn header(&self) -> Result<BlockHeader, PayloadError> {
        let header = self
            .header
            .as_ref()
            .ok_or(PayloadError::Missing("block.header"))?;
        let version = match &header.version {
            Some(v) => ConsensusVersion {
                block: v
                    .block
                    .as_u64()
                    .map_err(PayloadError::invalid("block.header.version.block"))?,
                app: v
                    .app
                    .as_u64()
                    .map_err(PayloadError::invalid("block.header.version.app"))?,
            },
            None => ConsensusVersion::default(),
        };
        let time = match &header.time {
            Some(t) => parse_timestamp(t).map_err(PayloadError::invalid("block.header.time"))?,
            None => Timestamp::default(),
        };
        let last_block_id = match &header.last_block_id {
            Some(id) => id.to_core()?,
            None => BlockId::default(),
        };

        Ok(BlockHeader {
            version,
            chain_id: header.chain_id.clone(),
            height: header
                .height
                .as_u64()
                .map_err(PayloadError::invalid("block.header.height"))?,
            time,
            last_block_id,
            last_commit_hash: header_hash_field(&header.last_commit_hash, "last_commit_hash")?,
            data_hash: header_hash_field(&header.data_hash, "data_hash")?,
            validators_hash: header_hash_field(&header.validators_hash, "validators_hash")?,
            next_validators_hash: header_hash_field(
                &header.next_validators_hash,
                "next_validators_hash",
            )?,
            consensus_hash: header_hash_field(&header.consensus_hash, "consensus_hash")?,
            app_hash: self.app_hash()?,
            last_results_hash: header_hash_field(&header.last_results_hash, "last_results_hash")?,
            evidence_hash: header_hash_field(&header.evidence_hash, "evidence_hash")?,
            proposer_address: header_hash_field(&header.proposer_address, "proposer_address")?,
        })
    }

    pub fn to_core(&self) -> Result<Block, PayloadError> {
        let commit = self
            .last_commit
            .as_ref()
            .ok_or(PayloadError::Missing("block.last_commit"))?;
        Ok(Block {
            header: self.header()?,
            last_commit: commit.to_core()?,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiCommit {
    pub height: ApiNumber,
    pub round: ApiNumber,
    pub block_id: ApiBlockId,
    #[serde(default)]
    pub signatures: Vec<ApiCommitSig>,
}

impl ApiCommit {
    pub fn to_core(&self) -> Result<Commit, PayloadError> {
        let round = self
            .round
            .as_i64()
            .and_then(|r| i32::try_from(r).map_err(|e| e.to_string()))
            .map_err(PayloadError::invalid("last_commit.round"))?;
        Ok(Commit {
            height: self
                .height
                .as_u64()
                .map_err(PayloadError::invalid("last_commit.height"))?,
            round,
            block_id: self.block_id.to_core()?,
            signatures: self
                .signatures
                .iter()
                .map(ApiCommitSig::to_core)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiBlockId {
    #[serde(default)]
    pub hash: String,
    #[serde(alias = "part_set_header")]
    pub parts: ApiPartSetHeader,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiPartSetHeader {
    pub total: ApiNumber,
    #[serde(default)]
    pub hash: String,
}

impl ApiBlockId {
    pub fn to_core(&self) -> Result<BlockId, PayloadError> {
        let total = self
            .parts
            .total
            .as_u64()
            .and_then(|t| u32::try_from(t).map_err(|e| e.to_string()))
            .map_err(PayloadError::invalid("block_id.parts.total"))?;
        Ok(BlockId {
            hash: hex_to_bytes(&self.hash).map_err(PayloadError::invalid("block_id.hash"))?,
            part_set_header: PartSetHeader {
                total,
                hash: hex_to_bytes(&self.parts.hash)
                    .map_err(PayloadError::invalid("block_id.parts.hash"))?,
            },
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiCommitSig {
    pub block_id_flag: ApiNumber,
    #[serde(default)]
    pub validator_address: String,
    pub timestamp: String,
    pub signature: Option<String>,
}

impl ApiCommitSig {
    pub fn to_core(&self) -> Result<CommitSig, PayloadError> {
        let block_id_flag = parse_block_id_flag(&self.block_id_flag)
            .map_err(PayloadError::invalid("block_id_flag"))?;
        let validator_address = if self.validator_address.is_empty() {
            None
        } else {
            Some(
                ValidatorAddress::from_hex(&self.validator_address)
                    .map_err(PayloadError::invalid("validator_address"))?,
            )
        };
        let signature = match self.signature.as_deref() {
            Some(s) if !s.is_empty() => {
                base64_to_bytes(s).map_err(PayloadError::invalid("signature"))?
            }
            _ => Vec::new(),
        };
        Ok(CommitSig {
            block_id_flag,
            validator_address,
            timestamp: parse_timestamp(&self.timestamp)
                .map_err(PayloadError::invalid("timestamp"))?,
            signature,
        })
    }
}

/// `2`, `"2"` and `"BLOCK_ID_FLAG_COMMIT"` all name the same flag.
fn parse_block_id_flag(flag: &ApiNumber) -> Result<BlockIdFlag, String> {
    match flag {
        ApiNumber::Str(s) if s.starts_with("BLOCK_ID_FLAG_") => {
            match &s["BLOCK_ID_FLAG_".len()..] {
                "ABSENT" => Ok(BlockIdFlag::Absent),
                "COMMIT" => Ok(BlockIdFlag::Commit),
                "NIL" => Ok(BlockIdFlag::Nil),
                other => Err(format!("unknown block id flag {}", other)),
            }
        }
        other => {
            let value = other.as_i64()?;
            let value = i32::try_from(value)
                .map_err(|_| format!("block id flag {} out of range", value))?;
            BlockIdFlag::from_i32(value)
        }
    }
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct ApiValidator {
    pub address: String,
    pub pub_key: ApiPubKey,
    pub voting_power: ApiNumber,
}

/// Either the participants endpoint's bare base64 key or the RPC's typed key.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiPubKey {
    Plain(String),
    Typed {
        #[serde(rename = "type")]
        key_type: String,
        value: String,
    },
}

impl ApiPubKey {
    pub fn to_core(&self) -> Result<Ed25519PublicKey, PayloadError> {
        let value = match self {
            ApiPubKey::Plain(value) => value,
            ApiPubKey::Typed { key_type, value } => {
                if !key_type.to_ascii_lowercase().contains("ed25519") {
                    return Err(PayloadError::Invalid {
                        field: "pub_key.type",
                        reason: format!("unsupported key type {}", key_type),
                    });
                }
                value
            }
        };
        Ed25519PublicKey::from_base64(value).map_err(PayloadError::invalid("pub_key"))
    }
}

impl ApiValidator {
    pub fn to_core(&self) -> Result<Validator, PayloadError> {
        Ok(Validator {
            address: ValidatorAddress::from_hex(&self.address)
                .map_err(PayloadError::invalid("validator.address"))?,
            pub_key: self.pub_key.to_core()?,
            voting_power: self
                .voting_power
                .as_u64()
                .map_err(PayloadError::invalid("validator.voting_power"))?,
        })
    }
}

// ---------------------------------------------------------------------------
// RPC documents
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ApiBlockResult {
    block: ApiBlock,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiBlockDocument {
    Rpc { result: ApiBlockResult },
    Plain(ApiBlockResult),
}

#[derive(Deserialize)]
struct ApiValidatorsResult {
    validators: Vec<ApiValidator>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiValidatorsDocument {
    Rpc { result: ApiValidatorsResult },
    Plain(ApiValidatorsResult),
    Bare(Vec<ApiValidator>),
}

/// Decode a `block?height=N` response, with or without the JSON-RPC envelope.
pub fn parse_block(bytes: &[u8]) -> Result<Block, PayloadError> {
    let block = match serde_json::from_slice::<ApiBlockDocument>(bytes)? {
        ApiBlockDocument::Rpc { result } | ApiBlockDocument::Plain(result) => result.block,
    };
    block.to_core()
}

/// Decode a `validators?height=N` response, with or without the JSON-RPC envelope.
pub fn parse_validators(bytes: &[u8]) -> Result<Vec<Validator>, PayloadError> {
    let validators = match serde_json::from_slice::<ApiValidatorsDocument>(bytes)? {
        ApiValidatorsDocument::Rpc { result } | ApiValidatorsDocument::Plain(result) => {
            result.validators
        }
        ApiValidatorsDocument::Bare(list) => list,
    };
    validators.iter().map(ApiValidator::to_core).collect()
}
