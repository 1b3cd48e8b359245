//! JSON fixtures shaped like the Gonka participants endpoint and chain RPC.

use base64::Engine as _;
use ed25519_dalek::{Signer, SigningKey};
use gonka_light_core::proof::ics23::{calculate_root, sha256};
use gonka_light_core::*;
use serde_json::{json, Value};

use crate::payload::parse_block;

pub(crate) const CHAIN_ID: &str = "gonka-testnet";

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn sha_leaf(prefix: &[u8]) -> LeafOp {
    LeafOp {
        hash: HashOp::Sha256,
        prehash_key: HashOp::NoHash,
        prehash_value: HashOp::Sha256,
        length: LengthOp::VarProto,
        prefix: prefix.to_vec(),
    }
}

/// IAVL proof of `value` in the `inference` store, then the store root in a
/// two-store multi-store. Returns the app hash and the proof ops.
pub(crate) fn prove_in_store(store_key: &[u8], value: &[u8]) -> ([u8; 32], Vec<ProofOp>) {
    let store_proof = ExistenceProof {
        key: store_key.to_vec(),
        value: value.to_vec(),
        leaf: sha_leaf(&[0x00, 0x02, 0x02]),
        path: vec![InnerOp {
            hash: HashOp::Sha256,
            prefix: vec![0x02, 0x04, 0x02, 0x20],
            suffix: [vec![0x20], vec![0x42; 32]].concat(),
        }],
    };
    let store_root = calculate_root(&store_proof).unwrap();

    let multistore = ExistenceProof {
        key: b"inference".to_vec(),
        value: store_root.to_vec(),
        leaf: sha_leaf(&[0x00]),
        path: vec![InnerOp {
            hash: HashOp::Sha256,
            prefix: [vec![0x01], sha256(b"bank").to_vec()].concat(),
            suffix: vec![],
        }],
    };
    let app_hash = calculate_root(&multistore).unwrap();

    let ops = vec![
        ProofOp {
            op_type: PROOF_OP_IAVL.into(),
            key: store_key.to_vec(),
            data: store_proof.encode_commitment(),
        },
        ProofOp {
            op_type: PROOF_OP_SIMPLE.into(),
            key: b"inference".to_vec(),
            data: multistore.encode_commitment(),
        },
    ];
    (app_hash, ops)
}

/// A `v1/epochs/{epoch}/participants` body for `set`, proven at `height`.
pub(crate) fn participants_payload(set: &ActiveParticipantSet, height: u64) -> Value {
    let bytes = set.encode();
    let key = format!("ActiveParticipants/value/epoch/{}", set.epoch_id);
    let (app_hash, ops) = prove_in_store(key.as_bytes(), &bytes);

    json!({
        "active_participants": serde_json::to_value(set).unwrap(),
        "addresses": set.participants.iter().map(|p| p.index.clone()).collect::<Vec<_>>(),
        "active_participants_bytes": hex::encode(&bytes),
        "proof_ops": {
            "ops": ops.iter().map(|op| json!({
                "type": op.op_type,
                "key": b64(&op.key),
                "data": b64(&op.data),
            })).collect::<Vec<_>>()
        },
        "block": {
            "header": {
                "chain_id": CHAIN_ID,
                "height": height,
                "app_hash": hex::encode_upper(app_hash),
            }
        },
        "excluded_participants": []
    })
}

pub(crate) fn public_key(key: &SigningKey) -> Ed25519PublicKey {
    Ed25519PublicKey(key.verifying_key().to_bytes())
}

fn validator_set(keys: &[SigningKey]) -> Vec<Validator> {
    keys.iter()
        .map(|key| Validator {
            address: public_key(key).address(),
            pub_key: public_key(key),
            voting_power: 10,
        })
        .collect()
}

/// A full CometBFT header at `height`, produced by the set `validators`.
pub(crate) fn header_json(height: u64, app_hash_hex: &str, validators: &[SigningKey]) -> Value {
    let set_hash = hex::encode_upper(validator_set_hash(&validator_set(validators)));
    let previous = sha256(format!("block {}", height - 1).as_bytes());
    json!({
        "version": { "block": "11" },
        "chain_id": CHAIN_ID,
        "height": height.to_string(),
        "time": format!("2025-08-20T10:{:02}:00.5Z", height % 60),
        "last_block_id": {
            "hash": hex::encode_upper(previous),
            "parts": { "total": 1, "hash": hex::encode_upper(sha256(&previous)) }
        },
        "last_commit_hash": hex::encode_upper(sha256(b"last commit")),
        "data_hash": hex::encode_upper(sha256(b"")),
        "validators_hash": set_hash,
        "next_validators_hash": set_hash,
        "consensus_hash": hex::encode_upper(sha256(b"consensus params")),
        "app_hash": app_hash_hex,
        "last_results_hash": "",
        "evidence_hash": hex::encode_upper(sha256(b"")),
        "proposer_address": public_key(&validators[0]).address().to_string(),
    })
}

fn rpc_block(header: Value, last_commit: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": -1,
        "result": {
            "block": {
                "header": header,
                "data": { "txs": [] },
                "last_commit": last_commit,
            }
        }
    })
}

/// A `chain-rpc/block?height=N` body for a block produced by `validators`.
/// Its own last commit is empty; the commit finalizing it arrives in N+1.
pub(crate) fn block_rpc(height: u64, app_hash_hex: &str, validators: &[SigningKey]) -> Value {
    rpc_block(
        header_json(height, app_hash_hex, validators),
        json!({
            "height": (height - 1).to_string(),
            "round": 0,
            "block_id": { "hash": "", "parts": { "total": 0, "hash": "" } },
            "signatures": [],
        }),
    )
}

/// The block after `finalized`, whose last commit `signers` sign over the
/// hash of `finalized`'s header.
pub(crate) fn next_block_rpc(finalized: &Value, signers: &[SigningKey]) -> Value {
    let header = parse_block(&serde_json::to_vec(finalized).unwrap())
        .unwrap()
        .header;
    let header_hash = header.hash().unwrap();
    let parts_hash = sha256(&header_hash);
    let template = VoteTemplate {
        height: header.height,
        round: 0,
        block_id: BlockId {
            hash: header_hash.to_vec(),
            part_set_header: PartSetHeader {
                total: 1,
                hash: parts_hash.to_vec(),
            },
        },
    };

    let signatures: Vec<Value> = signers
        .iter()
        .enumerate()
        .map(|(i, key)| {
            // RFC 3339 with the nanos CometBFT keeps
            let nanos = 250_000_000 + i as i32;
            let ts = Timestamp {
                seconds: 1_755_684_000 + i as i64,
                nanos,
            };
            let msg = template.sign_bytes(&header.chain_id, BlockIdFlag::Commit, ts);
            json!({
                "block_id_flag": 2,
                "validator_address": public_key(key).address().to_string(),
                "timestamp": format!("2025-08-20T10:00:{:02}.{:09}Z", i, nanos),
                "signature": b64(&key.sign(&msg).to_bytes()),
            })
        })
        .collect();

    let app_hash = hex::encode_upper(sha256(&header.app_hash));
    rpc_block(
        header_json(header.height + 1, &app_hash, signers),
        json!({
            "height": header.height.to_string(),
            "round": 0,
            "block_id": {
                "hash": hex::encode_upper(header_hash),
                "parts": { "total": 1, "hash": hex::encode_upper(parts_hash) }
            },
            "signatures": signatures,
        }),
    )
}

/// A `chain-rpc/validators?height=N` body, power 10 each.
pub(crate) fn validators_rpc(keys: &[SigningKey]) -> Value {
    let validators: Vec<Value> = keys
        .iter()
        .map(|key| {
            let pk = public_key(key);
            json!({
                "address": pk.address().to_string(),
                "pub_key": { "type": "tendermint/PubKeyEd25519", "value": pk.to_base64() },
                "voting_power": "10",
                "proposer_priority": "0",
            })
        })
        .collect();
    json!({ "result": { "validators": validators, "count": keys.len().to_string() } })
}
