use crate::protobuf::{self, ProtoReader, WIRE_LEN, WIRE_VARINT};
use serde::{Deserialize, Serialize};

/// Proof-op type tag for store-level (IAVL) inclusion.
pub const PROOF_OP_IAVL: &str = "ics23:iavl";

/// Proof-op type tag for multi-store (simple Merkle) inclusion.
pub const PROOF_OP_SIMPLE: &str = "ics23:simple";

/// One entry of an ABCI query's `proof_ops`: a type tag, the proven key,
/// and the protobuf-encoded ICS23 `CommitmentProof`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOp {
    #[serde(rename = "type")]
    pub op_type: String,
    pub key: Vec<u8>,
    pub data: Vec<u8>,
}

/// The two proof shapes this network produces. Anything else is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofOpKind {
    Iavl,
    Simple,
}

impl ProofOpKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            PROOF_OP_IAVL => Some(ProofOpKind::Iavl),
            PROOF_OP_SIMPLE => Some(ProofOpKind::Simple),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ProofOpKind::Iavl => PROOF_OP_IAVL,
            ProofOpKind::Simple => PROOF_OP_SIMPLE,
        }
    }
}

/// ICS23 `HashOp`. Only the operations used by the IAVL and Tendermint specs are supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashOp {
    NoHash,
    Sha256,
}

impl HashOp {
    pub fn from_i32(value: i32) -> Result<Self, String> {
        match value {
            0 => Ok(HashOp::NoHash),
            1 => Ok(HashOp::Sha256),
            other => Err(format!("Unsupported hash op {}", other)),
        }
    }

    pub fn to_i32(self) -> i32 {
        match self {
            HashOp::NoHash => 0,
            HashOp::Sha256 => 1,
        }
    }
}

/// ICS23 `LengthOp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthOp {
    NoPrefix,
    VarProto,
}

impl LengthOp {
    pub fn from_i32(value: i32) -> Result<Self, String> {
        match value {
            0 => Ok(LengthOp::NoPrefix),
            1 => Ok(LengthOp::VarProto),
            other => Err(format!("Unsupported length op {}", other)),
        }
    }

    pub fn to_i32(self) -> i32 {
        match self {
            LengthOp::NoPrefix => 0,
            LengthOp::VarProto => 1,
        }
    }
}

/// How the leaf hash is built from key and value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafOp {
    pub hash: HashOp,
    pub prehash_key: HashOp,
    pub prehash_value: HashOp,
    pub length: LengthOp,
    pub prefix: Vec<u8>,
}

/// One step up the tree: `hash(prefix || child || suffix)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerOp {
    pub hash: HashOp,
    pub prefix: Vec<u8>,
    pub suffix: Vec<u8>,
}

/// An ICS23 existence proof: the proven pair, the leaf op, and the path to the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExistenceProof {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub leaf: LeafOp,
    pub path: Vec<InnerOp>,
}

impl ExistenceProof {
    /// Decode a `CommitmentProof` message. Only the `exist` variant (field 1) is
    /// accepted; non-existence and batch proofs never appear in this response.
    pub fn decode_commitment(data: &[u8]) -> Result<Self, String> {
        let mut reader = ProtoReader::new(data);
        let mut exist = None;
        while !reader.is_empty() {
            let (field, wire) = reader.read_key()?;
            match field {
                1 => {
                    ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                    exist = Some(Self::decode(reader.read_bytes()?)?);
                }
                2..=4 => {
                    return Err(format!(
                        "Unsupported commitment proof variant (field {})",
                        field
                    ))
                }
                _ => reader.skip(wire)?,
            }
        }
        exist.ok_or_else(|| "Commitment proof has no existence proof".to_string())
    }

    fn decode(data: &[u8]) -> Result<Self, String> {
        let mut reader = ProtoReader::new(data);
        let mut key = Vec::new();
        let mut value = Vec::new();
        let mut leaf = None;
        let mut path = Vec::new();

        while !reader.is_empty() {
            let (field, wire) = reader.read_key()?;
            match field {
                1 => {
                    ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                    key = reader.read_bytes()?.to_vec();
                }
                2 => {
                    ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                    value = reader.read_bytes()?.to_vec();
                }
                3 => {
                    ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                    leaf = Some(decode_leaf_op(reader.read_bytes()?)?);
                }
                4 => {
                    ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                    path.push(decode_inner_op(reader.read_bytes()?)?);
                }
                _ => reader.skip(wire)?,
            }
        }

        Ok(Self {
            key,
            value,
            leaf: leaf.ok_or_else(|| "Existence proof has no leaf op".to_string())?,
            path,
        })
    }

    /// Encode as a `CommitmentProof { exist }` message.
    pub fn encode_commitment(&self) -> Vec<u8> {
        let mut exist = Vec::new();
        protobuf::put_bytes(1, &self.key, &mut exist);
        protobuf::put_bytes(2, &self.value, &mut exist);

        let mut leaf = Vec::new();
        protobuf::put_varint(1, self.leaf.hash.to_i32() as u64, &mut leaf);
        protobuf::put_varint(2, self.leaf.prehash_key.to_i32() as u64, &mut leaf);
        protobuf::put_varint(3, self.leaf.prehash_value.to_i32() as u64, &mut leaf);
        protobuf::put_varint(4, self.leaf.length.to_i32() as u64, &mut leaf);
        protobuf::put_bytes(5, &self.leaf.prefix, &mut leaf);
        protobuf::put_message(3, &leaf, &mut exist);

        for step in &self.path {
            let mut inner = Vec::new();
            protobuf::put_varint(1, step.hash.to_i32() as u64, &mut inner);
            protobuf::put_bytes(2, &step.prefix, &mut inner);
            protobuf::put_bytes(3, &step.suffix, &mut inner);
            protobuf::put_message(4, &inner, &mut exist);
        }

        let mut out = Vec::new();
        protobuf::put_message(1, &exist, &mut out);
        out
    }
}

fn decode_leaf_op(data: &[u8]) -> Result<LeafOp, String> {
    let mut reader = ProtoReader::new(data);
    let mut leaf = LeafOp {
        hash: HashOp::NoHash,
        prehash_key: HashOp::NoHash,
        prehash_value: HashOp::NoHash,
        length: LengthOp::NoPrefix,
        prefix: Vec::new(),
    };
    while !reader.is_empty() {
        let (field, wire) = reader.read_key()?;
        match field {
            1..=4 => {
                ProtoReader::expect_wire(field, wire, WIRE_VARINT)?;
                let value = reader.read_int32()?;
                match field {
                    1 => leaf.hash = HashOp::from_i32(value)?,
                    2 => leaf.prehash_key = HashOp::from_i32(value)?,
                    3 => leaf.prehash_value = HashOp::from_i32(value)?,
                    _ => leaf.length = LengthOp::from_i32(value)?,
                }
            }
            5 => {
                ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                leaf.prefix = reader.read_bytes()?.to_vec();
            }
            _ => reader.skip(wire)?,
        }
    }
    Ok(leaf)
}

fn decode_inner_op(data: &[u8]) -> Result<InnerOp, String> {
    let mut reader = ProtoReader::new(data);
    let mut inner = InnerOp {
        hash: HashOp::NoHash,
        prefix: Vec::new(),
        suffix: Vec::new(),
    };
    while !reader.is_empty() {
        let (field, wire) = reader.read_key()?;
        match field {
            1 => {
                ProtoReader::expect_wire(field, wire, WIRE_VARINT)?;
                inner.hash = HashOp::from_i32(reader.read_int32()?)?;
            }
            2 => {
                ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                inner.prefix = reader.read_bytes()?.to_vec();
            }
            3 => {
                ProtoReader::expect_wire(field, wire, WIRE_LEN)?;
                inner.suffix = reader.read_bytes()?.to_vec();
            }
            _ => reader.skip(wire)?,
        }
    }
    Ok(inner)
}
