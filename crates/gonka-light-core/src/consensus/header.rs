//! CometBFT header and validator-set hashes.
//!
//! Both are RFC 6962 simple Merkle trees: leaves hashed with a `0x00` prefix,
//! inner nodes with `0x01`, split at the largest power of two below the leaf
//! count. A commit's `block_id.hash` is the header hash, and the header's
//! `validators_hash` is the hash of the set that signs that commit.

use crate::consensus::vote::{encode_block_id, encode_timestamp};
use crate::proof::ics23::sha256;
use crate::protobuf;
use crate::types::chain::{BlockHeader, Validator};

/// Root of a simple Merkle tree over `leaves`. An empty tree hashes to SHA256("").
pub fn merkle_root(leaves: &[Vec<u8>]) -> [u8; 32] {
    match leaves.len() {
        0 => sha256(&[]),
        1 => leaf_hash(&leaves[0]),
        n => {
            let split = split_point(n);
            inner_hash(&merkle_root(&leaves[..split]), &merkle_root(&leaves[split..]))
        }
    }
}

fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k * 2 < n {
        k *= 2;
    }
    k
}

fn leaf_hash(leaf: &[u8]) -> [u8; 32] {
    sha256(&[&[0x00][..], leaf].concat())
}

fn inner_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    sha256(&[&[0x01][..], &left[..], &right[..]].concat())
}

/// `gogoproto` wrapper message (`BytesValue`, `StringValue`) around one field.
fn wrapped_bytes(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    protobuf::put_bytes(1, value, &mut out);
    out
}

fn wrapped_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    protobuf::put_varint(1, value, &mut out);
    out
}

impl BlockHeader {
    /// The CometBFT header hash, i.e. the `block_id.hash` validators sign.
    ///
    /// `None` when the header carries no validators hash, which CometBFT
    /// treats as an incomplete header with no hash at all.
    pub fn hash(&self) -> Option<[u8; 32]> {
        if self.validators_hash.is_empty() {
            return None;
        }

        let mut version = Vec::new();
        protobuf::put_varint(1, self.version.block, &mut version);
        protobuf::put_varint(2, self.version.app, &mut version);

        let leaves = vec![
            version,
            wrapped_bytes(self.chain_id.as_bytes()),
            wrapped_varint(self.height),
            encode_timestamp(self.time),
            encode_block_id(&self.last_block_id),
            wrapped_bytes(&self.last_commit_hash),
            wrapped_bytes(&self.data_hash),
            wrapped_bytes(&self.validators_hash),
            wrapped_bytes(&self.next_validators_hash),
            wrapped_bytes(&self.consensus_hash),
            wrapped_bytes(&self.app_hash),
            wrapped_bytes(&self.last_results_hash),
            wrapped_bytes(&self.evidence_hash),
            wrapped_bytes(&self.proposer_address),
        ];
        Some(merkle_root(&leaves))
    }
}

/// Hash of a validator set in the order the chain lists it. Each leaf is a
/// `SimpleValidator { pub_key: PublicKey { ed25519 }, voting_power }`.
pub fn validator_set_hash(validators: &[Validator]) -> [u8; 32] {
    let leaves: Vec<Vec<u8>> = validators.iter().map(simple_validator_bytes).collect();
    merkle_root(&leaves)
}

fn simple_validator_bytes(validator: &Validator) -> Vec<u8> {
    let mut key = Vec::with_capacity(34);
    protobuf::put_bytes(1, &validator.pub_key.0, &mut key);

    let mut out = Vec::with_capacity(48);
    protobuf::put_message(1, &key, &mut out);
    protobuf::put_varint(2, validator.voting_power, &mut out);
    out
}
