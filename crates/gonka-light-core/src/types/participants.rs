use crate::protobuf::{self, ProtoReader, WIRE_LEN, WIRE_VARINT};
use crate::types::chain::{BlockHeader, Ed25519PublicKey, Validator};
use crate::types::proof::ProofOp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which epoch's participant set to ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpochRef {
    Current,
    Id(u64),
}

impl fmt::Display for EpochRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpochRef::Current => write!(f, "current"),
            EpochRef::Id(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for EpochRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("epoch identifier is empty".to_string()),
            "current" => Ok(EpochRef::Current),
            other => other
                .parse::<u64>()
                .map(EpochRef::Id)
                .map_err(|e| format!("invalid epoch identifier {:?}: {}", other, e)),
        }
    }
}

/// Randomness a participant committed to for the epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomSeed {
    pub participant: String,
    pub block_height: i64,
    pub signature: String,
}

/// A network endpoint certified for one epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveParticipant {
    /// Account address of the participant; also its transfer address.
    pub index: String,
    /// Base64 Ed25519 consensus key, if the participant also validates.
    pub validator_key: String,
    pub weight: i64,
    pub inference_url: String,
    pub models: Vec<String>,
    pub seed: Option<RandomSeed>,
}

impl ActiveParticipant {
    /// The participant's consensus key, if it carries a well-formed one.
    pub fn consensus_key(&self) -> Option<Ed25519PublicKey> {
        if self.validator_key.is_empty() {
            return None;
        }
        Ed25519PublicKey::from_base64(&self.validator_key).ok()
    }
}

/// The participant set consensus fixed for one epoch. Decoded from the exact
/// bytes the inclusion proof covered, never from the server's JSON mirror.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveParticipantSet {
    pub participants: Vec<ActiveParticipant>,
    pub epoch_group_id: u64,
    pub poc_start_block_height: i64,
    pub effective_block_height: i64,
    pub created_at_block_height: i64,
    pub epoch_id: u64,
}

impl ActiveParticipantSet {
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let mut reader = ProtoReader::new(bytes);
        let mut set = ActiveParticipantSet::default();
        while !reader.is_empty() {
            let (field, wire) = reader.read_key()?;
            match field {
                1 => {
                    ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                    set.participants
                        .push(decode_participant(reader.read_bytes()?)?);
                }
                2..=6 => {
                    ProtoReader::expect_wire(field, wire, WIRE_VARINT)?;
                    let value = reader.read_varint()?;
                    match field {
                        2 => set.epoch_group_id = value,
                        3 => set.poc_start_block_height = value as i64,
                        4 => set.effective_block_height = value as i64,
                        5 => set.created_at_block_height = value as i64,
                        _ => set.epoch_id = value,
                    }
                }
                _ => reader.skip(wire)?,
            }
        }
        Ok(set)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for participant in &self.participants {
            protobuf::put_message(1, &encode_participant(participant), &mut out);
        }
        protobuf::put_varint(2, self.epoch_group_id, &mut out);
        protobuf::put_varint(3, self.poc_start_block_height as u64, &mut out);
        protobuf::put_varint(4, self.effective_block_height as u64, &mut out);
        protobuf::put_varint(5, self.created_at_block_height as u64, &mut out);
        protobuf::put_varint(6, self.epoch_id, &mut out);
        out
    }

    /// Consensus keys of every participant that carries one.
    pub fn consensus_keys(&self) -> Vec<Ed25519PublicKey> {
        self.participants
            .iter()
            .filter_map(ActiveParticipant::consensus_key)
            .collect()
    }

    /// Consensus keys paired with the participant's weight. Negative weights
    /// count as zero.
    pub fn weighted_keys(&self) -> Vec<(Ed25519PublicKey, u64)> {
        self.participants
            .iter()
            .filter_map(|p| {
                p.consensus_key()
                    .map(|key| (key, u64::try_from(p.weight).unwrap_or(0)))
            })
            .collect()
    }
}

fn decode_participant(bytes: &[u8]) -> Result<ActiveParticipant, String> {
    let mut reader = ProtoReader::new(bytes);
    let mut participant = ActiveParticipant::default();
    while !reader.is_empty() {
        let (field, wire) = reader.read_key()?;
        match field {
            1 | 2 | 4 | 5 => {
                ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                let s = reader.read_string()?;
                match field {
                    1 => participant.index = s,
                    2 => participant.validator_key = s,
                    4 => participant.inference_url = s,
                    _ => participant.models.push(s),
                }
            }
            3 => {
                ProtoReader::expect_wire(field, wire, WIRE_VARINT)?;
                participant.weight = reader.read_varint()? as i64;
            }
            6 => {
                ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                participant.seed = Some(decode_seed(reader.read_bytes()?)?);
            }
            _ => reader.skip(wire)?,
        }
    }
    Ok(participant)
}

fn decode_seed(bytes: &[u8]) -> Result<RandomSeed, String> {
    let mut reader = ProtoReader::new(bytes);
    let mut seed = RandomSeed::default();
    while !reader.is_empty() {
        let (field, wire) = reader.read_key()?;
        match field {
            1 => {
                ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                seed.participant = reader.read_string()?;
            }
            2 => {
                ProtoReader::expect_wire(field, wire, WIRE_VARINT)?;
                seed.block_height = reader.read_varint()? as i64;
            }
            3 => {
                ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                seed.signature = reader.read_string()?;
            }
            _ => reader.skip(wire)?,
        }
    }
    Ok(seed)
}

fn encode_participant(p: &ActiveParticipant) -> Vec<u8> {
    let mut out = Vec::new();
    protobuf::put_bytes(1, p.index.as_bytes(), &mut out);
    protobuf::put_bytes(2, p.validator_key.as_bytes(), &mut out);
    protobuf::put_varint(3, p.weight as u64, &mut out);
    protobuf::put_bytes(4, p.inference_url.as_bytes(), &mut out);
    for model in &p.models {
        protobuf::put_message(5, model.as_bytes(), &mut out);
    }
    if let Some(seed) = &p.seed {
        let mut s = Vec::new();
        protobuf::put_bytes(1, seed.participant.as_bytes(), &mut s);
        protobuf::put_varint(2, seed.block_height as u64, &mut s);
        protobuf::put_bytes(3, seed.signature.as_bytes(), &mut s);
        protobuf::put_message(6, &s, &mut out);
    }
    out
}

/// Everything one `GET v1/epochs/{epoch}/participants` returns, decoded but not yet trusted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantsWithProof {
    /// Raw protobuf bytes of the participant set; this is what the proof covers.
    pub participants_bytes: Vec<u8>,
    /// The store-level and multi-store proof ops, in that order.
    pub proof_ops: Vec<ProofOp>,
    /// Header of the block whose app hash the proof is against. Only the
    /// height and app hash are relied on; the walk fetches the full header.
    pub header: BlockHeader,
    /// Validator set at that height, when the server includes it.
    pub validators: Option<Vec<Validator>>,
}
