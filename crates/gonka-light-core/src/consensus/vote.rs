use crate::protobuf;
use crate::types::chain::{BlockId, BlockIdFlag, Commit, Timestamp};

/// `SignedMsgType` value for a precommit vote; commits are made of precommits.
pub const PRECOMMIT_TYPE: u64 = 2;

/// The parts of a vote shared by every signature in one commit.
/// Each signer's own timestamp is substituted in before canonicalizing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteTemplate {
    pub height: u64,
    pub round: i32,
    pub block_id: BlockId,
}

impl VoteTemplate {
    pub fn from_commit(commit: &Commit) -> Self {
        Self {
            height: commit.height,
            round: commit.round,
            block_id: commit.block_id.clone(),
        }
    }

    /// The bytes a validator with this flag signed at `timestamp`.
    /// Nil voters signed an empty block id, not the committed one.
    pub fn sign_bytes(&self, chain_id: &str, flag: BlockIdFlag, timestamp: Timestamp) -> Vec<u8> {
        let empty = BlockId::default();
        let block_id = match flag {
            BlockIdFlag::Nil => &empty,
            BlockIdFlag::Commit | BlockIdFlag::Absent => &self.block_id,
        };
        canonical_vote_bytes(chain_id, self.height, self.round, block_id, timestamp)
    }
}

/// Length-delimited protobuf encoding of a CometBFT `CanonicalVote` of type
/// precommit. This is exactly what `PrivValidator.SignVote` signs, so any
/// divergence from CometBFT's encoding fails every signature check.
///
/// ```text
/// CanonicalVote {
///   type      = 1 (varint)    PRECOMMIT
///   height    = 2 (sfixed64)
///   round     = 3 (sfixed64)
///   block_id  = 4 (message)   omitted when zero
///   timestamp = 5 (message)   always present
///   chain_id  = 6 (string)
/// }
/// ```
pub fn canonical_vote_bytes(
    chain_id: &str,
    height: u64,
    round: i32,
    block_id: &BlockId,
    timestamp: Timestamp,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(128);
    protobuf::put_varint(1, PRECOMMIT_TYPE, &mut body);
    protobuf::put_sfixed64(2, height as i64, &mut body);
    protobuf::put_sfixed64(3, i64::from(round), &mut body);
    if !block_id.is_zero() {
        protobuf::put_message(4, &encode_block_id(block_id), &mut body);
    }
    protobuf::put_message(5, &encode_timestamp(timestamp), &mut body);
    protobuf::put_bytes(6, chain_id.as_bytes(), &mut body);

    let mut out = Vec::with_capacity(body.len() + 2);
    protobuf::encode_varint(body.len() as u64, &mut out);
    out.extend_from_slice(&body);
    out
}

pub(crate) fn encode_block_id(block_id: &BlockId) -> Vec<u8> {
    let mut psh = Vec::new();
    protobuf::put_varint(1, u64::from(block_id.part_set_header.total), &mut psh);
    protobuf::put_bytes(2, &block_id.part_set_header.hash, &mut psh);

    let mut out = Vec::new();
    protobuf::put_bytes(1, &block_id.hash, &mut out);
    protobuf::put_message(2, &psh, &mut out);
    out
}

pub(crate) fn encode_timestamp(ts: Timestamp) -> Vec<u8> {
    let mut out = Vec::new();
    // negative seconds are sign-extended int64 varints
    protobuf::put_varint(1, ts.seconds as u64, &mut out);
    protobuf::put_varint(2, i64::from(ts.nanos) as u64, &mut out);
    out
}
