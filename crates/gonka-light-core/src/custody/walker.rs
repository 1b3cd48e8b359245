use crate::config::VerifierConfig;
use crate::consensus::anchor::{parse_anchor_hash, TrustAnchor};
use crate::consensus::header::validator_set_hash;
use crate::consensus::signatures::{has_quorum, verify_signatures};
use crate::consensus::vote::VoteTemplate;
use crate::custody::source::ChainSource;
use crate::error::VerifyError;
use crate::proof::inclusion::verify_participants_against_app_hash;
use crate::types::chain::*;
use crate::types::participants::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A participant set whose custody has been traced back to the anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedChain {
    /// Epoch the walk started from.
    pub epoch_id: u64,
    /// The participant set of that epoch, decoded from proven bytes.
    pub participants: ActiveParticipantSet,
    /// App hash the participant set was proven against.
    pub app_hash: Vec<u8>,
    /// Epoch whose block carried the anchor hash.
    pub anchor_epoch: u64,
    /// Number of epoch-to-epoch hand-offs verified.
    pub hops: u64,
}

/// One epoch's participant set after its inclusion proof has been checked.
struct EpochSnapshot {
    epoch_id: u64,
    set: ActiveParticipantSet,
    header: BlockHeader,
    validators: Option<Vec<Validator>>,
}

/// Walks epochs from newest to oldest until a block carrying the trust anchor
/// is reached. Each epoch's block must be signed by validators that the
/// previous epoch certified as active participants.
///
/// Epoch 0 is genesis; it is the last epoch whose app hash can match.
pub struct CustodyWalker<S> {
    source: S,
    config: VerifierConfig,
}

impl<S: ChainSource> CustodyWalker<S> {
    pub fn new(source: S, config: VerifierConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn verify_chain(
        &self,
        anchor: &TrustAnchor,
        epoch: EpochRef,
    ) -> Result<VerifiedChain, VerifyError> {
        let start = self.load_epoch(epoch)?;
        let epoch_id = start.epoch_id;
        let app_hash = start.header.app_hash.clone();
        let participants = start.set.clone();

        let mut current = start;
        let mut hops = 0u64;

        loop {
            if anchor.matches(&current.header.app_hash) {
                info!(
                    epoch = epoch_id,
                    anchor_epoch = current.epoch_id,
                    hops,
                    participants = participants.participants.len(),
                    "Participant set verified back to trust anchor"
                );
                return Ok(VerifiedChain {
                    epoch_id,
                    participants,
                    app_hash,
                    anchor_epoch: current.epoch_id,
                    hops,
                });
            }

            if current.epoch_id == 0 {
                warn!(%anchor, "Reached genesis without meeting the trust anchor");
                return Err(VerifyError::ChainExhausted {
                    anchor: anchor.to_string(),
                    last_epoch: 0,
                });
            }

            if let Some(max_epochs) = self.config.max_epochs {
                if hops >= max_epochs {
                    return Err(VerifyError::DepthExceeded { max_epochs });
                }
            }

            let previous = self.load_epoch(EpochRef::Id(current.epoch_id - 1))?;
            self.verify_handoff(&current, &previous)?;

            hops += 1;
            current = previous;
        }
    }

    /// Fetch an epoch's participants and accept them only if they are proven
    /// under the app hash the response points at.
    fn load_epoch(&self, epoch: EpochRef) -> Result<EpochSnapshot, VerifyError> {
        let response = self
            .source
            .participants(epoch)
            .map_err(|e| VerifyError::fetch(format!("participants for epoch {}", epoch), e))?;

        verify_participants_against_app_hash(
            &response.header.app_hash,
            &response.proof_ops,
            &response.participants_bytes,
        )?;

        let set = ActiveParticipantSet::decode(&response.participants_bytes)
            .map_err(|reason| VerifyError::MalformedParticipants { reason })?;

        if let EpochRef::Id(expected) = epoch {
            if set.epoch_id != expected {
                return Err(VerifyError::EpochMismatch {
                    expected,
                    got: set.epoch_id,
                });
            }
        }

        debug!(
            epoch = set.epoch_id,
            height = response.header.height,
            participants = set.participants.len(),
            "Participant set proven against app hash"
        );

        Ok(EpochSnapshot {
            epoch_id: set.epoch_id,
            set,
            header: response.header,
            validators: response.validators,
        })
    }

    /// Check that `current`'s header was finalized by validators `previous`
    /// certified.
    ///
    /// The commit for height H travels in block H+1 as `last_commit`. It must
    /// be for height H and for the hash of header H, and header H must commit
    /// to the validator set that signed it.
    fn verify_handoff(
        &self,
        current: &EpochSnapshot,
        previous: &EpochSnapshot,
    ) -> Result<(), VerifyError> {
        let height = current.header.height;

        let header = self
            .source
            .block(height)
            .map_err(|e| VerifyError::fetch(format!("block at height {}", height), e))?
            .header;
        if header.app_hash != current.header.app_hash {
            return Err(VerifyError::HeaderMismatch {
                height,
                expected: hex::encode(&current.header.app_hash),
                got: hex::encode(&header.app_hash),
            });
        }
        if header.height != height {
            return Err(VerifyError::CommitMismatch {
                height,
                reason: format!("block endpoint returned header for height {}", header.height),
            });
        }
        let header_hash = header
            .hash()
            .ok_or(VerifyError::IncompleteHeader { height })?;

        let commit = self
            .source
            .block(height + 1)
            .map_err(|e| VerifyError::fetch(format!("block at height {}", height + 1), e))?
            .last_commit;
        check_commit_target(&commit, height, &header_hash)?;

        let validators = match &current.validators {
            Some(validators) => validators.clone(),
            None => self
                .source
                .validators(height)
                .map_err(|e| VerifyError::fetch(format!("validators at height {}", height), e))?,
        };
        let set_hash = validator_set_hash(&validators);
        if set_hash[..] != header.validators_hash[..] {
            return Err(VerifyError::ValidatorSetMismatch {
                height,
                expected: hex::encode_upper(&header.validators_hash),
                got: hex::encode_upper(set_hash),
            });
        }

        let committee = Committee::of(&previous.set);
        let trusted = certified_validators(&validators, &committee)?;
        debug!(
            epoch = current.epoch_id,
            height,
            validators = validators.len(),
            certified = trusted.len(),
            committee = committee.members.len(),
            "Checking commit against previous epoch's participants"
        );

        let template = VoteTemplate::from_commit(&commit);
        let tally = verify_signatures(&template, &header.chain_id, &trusted, &commit.signatures)?;
        if tally.committed.is_empty() {
            return Err(VerifyError::EmptyCommit {
                height: commit.height,
            });
        }

        if self.config.require_quorum {
            let signed = tally.committed_weight(|address| committee.weight_of(address));
            let total = committee.total_weight();
            if !has_quorum(signed, total) {
                return Err(VerifyError::InsufficientVotingPower {
                    height: commit.height,
                    signed,
                    total,
                });
            }
        }

        debug!(
            epoch = current.epoch_id,
            committed = tally.committed.len(),
            nil = tally.nil.len(),
            absent = tally.absent,
            "Epoch hand-off verified"
        );
        Ok(())
    }
}

/// The commit must finalize exactly `header_hash` at `height`.
fn check_commit_target(
    commit: &Commit,
    height: u64,
    header_hash: &[u8; 32],
) -> Result<(), VerifyError> {
    if commit.height != height {
        return Err(VerifyError::CommitMismatch {
            height,
            reason: format!("commit is for height {}", commit.height),
        });
    }
    if commit.block_id.hash[..] != header_hash[..] {
        return Err(VerifyError::CommitMismatch {
            height,
            reason: format!(
                "commit signs block {}, header hashes to {}",
                hex::encode_upper(&commit.block_id.hash),
                hex::encode_upper(header_hash)
            ),
        });
    }
    Ok(())
}

/// Consensus keys and proven weights of one epoch's participants: the only
/// voting power the walk trusts.
struct Committee {
    members: BTreeMap<ValidatorAddress, (Ed25519PublicKey, u64)>,
}

impl Committee {
    fn of(set: &ActiveParticipantSet) -> Self {
        let mut members = BTreeMap::new();
        for (key, weight) in set.weighted_keys() {
            members.entry(key.address()).or_insert((key, weight));
        }
        Self { members }
    }

    fn weight_of(&self, address: &ValidatorAddress) -> u64 {
        self.members.get(address).map_or(0, |(_, weight)| *weight)
    }

    fn total_weight(&self) -> u64 {
        self.members
            .values()
            .map(|(_, weight)| *weight)
            .fold(0u64, u64::saturating_add)
    }
}

/// Keep the validators whose key belongs to a member of `committee`.
/// Every validator's address must be the one its key derives to.
fn certified_validators(
    validators: &[Validator],
    committee: &Committee,
) -> Result<BTreeMap<ValidatorAddress, Ed25519PublicKey>, VerifyError> {
    let mut trusted = BTreeMap::new();
    for validator in validators {
        if validator.pub_key.address() != validator.address {
            return Err(VerifyError::InvalidPublicKey {
                address: validator.address.to_string(),
                reason: format!("key derives to address {}", validator.pub_key.address()),
            });
        }
        if let Some((key, _)) = committee.members.get(&validator.address) {
            if *key == validator.pub_key {
                trusted.insert(validator.address, validator.pub_key);
            }
        }
    }
    Ok(trusted)
}

/// Verify the participants of `epoch` back to `anchor_hex` in one call.
/// Both identifiers are parsed here; empty ones are `InvalidInput`.
pub fn verify_chain_of_custody<S: ChainSource>(
    source: S,
    config: VerifierConfig,
    anchor_hex: &str,
    epoch: &str,
) -> Result<VerifiedChain, VerifyError> {
    let anchor = parse_anchor_hash(anchor_hex)?;
    let epoch: EpochRef = epoch
        .parse()
        .map_err(|reason| VerifyError::InvalidInput { reason })?;
    CustodyWalker::new(source, config).verify_chain(&anchor, epoch)
}
