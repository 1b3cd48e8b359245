//! In-memory chain of epochs for exercising the custody walk.

use crate::consensus::header::validator_set_hash;
use crate::consensus::vote::VoteTemplate;
use crate::custody::source::ChainSource;
use crate::error::FetchError;
use crate::proof::ics23::tests::{iavl_proof, leaf};
use crate::proof::ics23::{calculate_root, sha256};
use crate::types::chain::*;
use crate::types::participants::*;
use crate::types::proof::*;
use ed25519_dalek::{Signer, SigningKey};
use std::collections::BTreeMap;

pub(crate) const CHAIN_ID: &str = "gonka-testnet";

/// Prove `value` under `store_key` in the `inference` store of a two-store
/// multi-store. Returns the app hash and the two proof ops.
pub(crate) fn prove_in_store(store_key: &[u8], value: &[u8]) -> ([u8; 32], Vec<ProofOp>) {
    let (store_proof, store_root) = iavl_proof(store_key, value, [0x42; 32]);

    // "bank" store hash on the left, "inference" store on the right
    let multistore = ExistenceProof {
        key: b"inference".to_vec(),
        value: store_root.to_vec(),
        leaf: leaf(&[0x00]),
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

/// A chain where every epoch's header is finalized by the previous epoch's
/// participants, all with voting power and weight 10.
///
/// The header of epoch `e` sits at `height(e)`; the commit for it travels as
/// `last_commit` of the block at `height(e) + 1`, signed over the real header
/// hash. After editing a validator set or signer list, call `seal` to bring
/// the header and commit back in line.
pub(crate) struct MockChain {
    pub current: u64,
    pub sets: Vec<ActiveParticipantSet>,
    pub responses: BTreeMap<u64, ParticipantsWithProof>,
    pub blocks: BTreeMap<u64, Block>,
    pub validator_sets: BTreeMap<u64, Vec<Validator>>,
    signers: BTreeMap<u64, Vec<SigningKey>>,
    keys: Vec<Vec<SigningKey>>,
}

impl MockChain {
    pub fn build(epochs: u64, signers: usize) -> Self {
        let keys: Vec<Vec<SigningKey>> = (0..=epochs)
            .map(|e| {
                (0..signers)
                    .map(|i| SigningKey::from_bytes(&[(e as u8) * 16 + i as u8 + 1; 32]))
                    .collect()
            })
            .collect();

        let mut chain = MockChain {
            current: epochs,
            sets: Vec::new(),
            responses: BTreeMap::new(),
            blocks: BTreeMap::new(),
            validator_sets: BTreeMap::new(),
            signers: BTreeMap::new(),
            keys,
        };

        for epoch in 0..=epochs {
            let height = chain.height(epoch);
            let set = participant_set(epoch, &chain.keys[epoch as usize]);
            let bytes = set.encode();
            let store_key = format!("ActiveParticipants/value/epoch/{}", epoch);
            let (app_hash, proof_ops) = prove_in_store(store_key.as_bytes(), &bytes);

            let signing = chain.keys[epoch.saturating_sub(1) as usize].clone();
            let validators: Vec<Validator> = signing.iter().map(|k| validator(k, 10)).collect();
            let header = full_header(height, app_hash.to_vec(), &validators);

            chain.blocks.insert(
                height,
                Block {
                    last_commit: Commit {
                        height: height - 1,
                        round: 0,
                        block_id: header.last_block_id.clone(),
                        signatures: Vec::new(),
                    },
                    header,
                },
            );
            chain.validator_sets.insert(height, validators);
            chain.signers.insert(height, signing);
            chain.seal(height);

            // the participants endpoint only echoes height and app hash
            chain.responses.insert(
                epoch,
                ParticipantsWithProof {
                    participants_bytes: bytes,
                    proof_ops,
                    header: BlockHeader {
                        chain_id: CHAIN_ID.into(),
                        height,
                        app_hash: app_hash.to_vec(),
                        ..Default::default()
                    },
                    validators: None,
                },
            );
            chain.sets.push(set);
        }
        chain
    }

    pub fn height(&self, epoch: u64) -> u64 {
        10 + epoch * 100
    }

    pub fn app_hash(&self, epoch: u64) -> [u8; 32] {
        let hash = &self.responses[&epoch].header.app_hash;
        let mut out = [0u8; 32];
        out.copy_from_slice(hash);
        out
    }

    /// Genesis app hash.
    pub fn anchor(&self) -> crate::consensus::anchor::TrustAnchor {
        crate::consensus::anchor::TrustAnchor(self.app_hash(0))
    }

    /// The commit finalizing the header at `height`.
    pub fn commit_for(&mut self, height: u64) -> &mut Commit {
        &mut self.blocks.get_mut(&(height + 1)).unwrap().last_commit
    }

    /// Recompute the header's validators hash from the validator set, then
    /// re-sign the commit for the resulting header hash.
    pub fn seal(&mut self, height: u64) {
        let validators_hash = validator_set_hash(&self.validator_sets[&height]).to_vec();
        let block = self.blocks.get_mut(&height).unwrap();
        block.header.validators_hash = validators_hash.clone();
        block.header.next_validators_hash = validators_hash;
        let header = block.header.clone();

        let commit = signed_commit(&header, &self.signers[&height]);
        self.blocks.insert(
            height + 1,
            Block {
                header: BlockHeader {
                    chain_id: header.chain_id.clone(),
                    height: height + 1,
                    last_block_id: commit.block_id.clone(),
                    ..Default::default()
                },
                last_commit: commit,
            },
        );
    }

    /// Add a validator that also signs the commit for `height`.
    pub fn add_signer(&mut self, height: u64, key: &SigningKey, power: u64) {
        self.validator_sets
            .get_mut(&height)
            .unwrap()
            .push(validator(key, power));
        self.signers.get_mut(&height).unwrap().push(key.clone());
        self.seal(height);
    }

    /// Take a validator out of the set at `height` as if the chain never had it.
    pub fn remove_validator(&mut self, height: u64, index: usize) {
        self.validator_sets.get_mut(&height).unwrap().remove(index);
        self.signers.get_mut(&height).unwrap().remove(index);
        self.seal(height);
    }

    pub fn mark_absent(&mut self, height: u64, indices: &[usize]) {
        let commit = self.commit_for(height);
        for &i in indices {
            commit.signatures[i] = CommitSig {
                block_id_flag: BlockIdFlag::Absent,
                validator_address: None,
                timestamp: Timestamp::GO_ZERO,
                signature: vec![],
            };
        }
    }
}

impl ChainSource for MockChain {
    fn participants(&self, epoch: EpochRef) -> Result<ParticipantsWithProof, FetchError> {
        let id = match epoch {
            EpochRef::Current => self.current,
            EpochRef::Id(id) => id,
        };
        self.responses
            .get(&id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("epoch {}", id)))
    }

    fn block(&self, height: u64) -> Result<Block, FetchError> {
        self.blocks
            .get(&height)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("block {}", height)))
    }

    fn validators(&self, height: u64) -> Result<Vec<Validator>, FetchError> {
        self.validator_sets
            .get(&height)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("validators {}", height)))
    }
}

fn public_key(key: &SigningKey) -> Ed25519PublicKey {
    Ed25519PublicKey(key.verifying_key().to_bytes())
}

fn validator(key: &SigningKey, power: u64) -> Validator {
    let pub_key = public_key(key);
    Validator {
        address: pub_key.address(),
        pub_key,
        voting_power: power,
    }
}

fn participant_set(epoch: u64, keys: &[SigningKey]) -> ActiveParticipantSet {
    ActiveParticipantSet {
        participants: keys
            .iter()
            .enumerate()
            .map(|(i, key)| ActiveParticipant {
                index: format!("gonka1epoch{}participant{}", epoch, i),
                validator_key: public_key(key).to_base64(),
                weight: 10,
                inference_url: format!("http://e{}-n{}.example:8000", epoch, i),
                models: vec!["Qwen/Qwen2.5-7B-Instruct".into()],
                seed: None,
            })
            .collect(),
        epoch_group_id: epoch,
        poc_start_block_height: (epoch * 100) as i64,
        effective_block_height: (epoch * 100 + 10) as i64,
        created_at_block_height: (epoch * 100 + 5) as i64,
        epoch_id: epoch,
    }
}

fn full_header(height: u64, app_hash: Vec<u8>, validators: &[Validator]) -> BlockHeader {
    let previous = height - 1;
    BlockHeader {
        version: ConsensusVersion { block: 11, app: 0 },
        chain_id: CHAIN_ID.into(),
        height,
        time: Timestamp {
            seconds: 1_700_000_000 + height as i64 * 5,
            nanos: 0,
        },
        last_block_id: BlockId {
            hash: sha256(format!("block {}", previous).as_bytes()).to_vec(),
            part_set_header: PartSetHeader {
                total: 1,
                hash: sha256(format!("parts {}", previous).as_bytes()).to_vec(),
            },
        },
        last_commit_hash: sha256(format!("commit {}", previous).as_bytes()).to_vec(),
        data_hash: sha256(b"").to_vec(),
        validators_hash: validator_set_hash(validators).to_vec(),
        next_validators_hash: validator_set_hash(validators).to_vec(),
        consensus_hash: sha256(b"consensus params").to_vec(),
        app_hash,
        last_results_hash: sha256(b"").to_vec(),
        evidence_hash: sha256(b"").to_vec(),
        proposer_address: validators
            .first()
            .map(|v| v.address.0.to_vec())
            .unwrap_or_default(),
    }
}

/// A commit for `header`, signed by every key over the real header hash.
fn signed_commit(header: &BlockHeader, keys: &[SigningKey]) -> Commit {
    let mut commit = Commit {
        height: header.height,
        round: 0,
        block_id: BlockId {
            hash: header.hash().unwrap().to_vec(),
            part_set_header: PartSetHeader {
                total: 1,
                hash: sha256(format!("parts {}", header.height).as_bytes()).to_vec(),
            },
        },
        signatures: Vec::new(),
    };
    for (i, key) in keys.iter().enumerate() {
        let sig = commit_sig(&commit, &header.chain_id, key, i);
        commit.signatures.push(sig);
    }
    commit
}

fn commit_sig(commit: &Commit, chain_id: &str, key: &SigningKey, i: usize) -> CommitSig {
    let timestamp = Timestamp {
        seconds: 1_700_000_000 + commit.height as i64 * 5 + i as i64,
        nanos: i as i32 * 1_000,
    };
    let msg = VoteTemplate::from_commit(commit).sign_bytes(chain_id, BlockIdFlag::Commit, timestamp);
    CommitSig {
        block_id_flag: BlockIdFlag::Commit,
        validator_address: Some(public_key(key).address()),
        timestamp,
        signature: key.sign(&msg).to_bytes().to_vec(),
    }
}
