use crate::consensus::vote::VoteTemplate;
use crate::error::VerifyError;
use crate::types::chain::*;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use std::collections::BTreeMap;

/// Outcome of a fully valid signature set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureTally {
    /// Validators whose signature is for the committed block.
    pub committed: Vec<ValidatorAddress>,
    /// Validators that signed a nil vote.
    pub nil: Vec<ValidatorAddress>,
    /// Entries with no vote at all.
    pub absent: usize,
}

impl SignatureTally {
    /// Weight behind the committed block. Weights come from the caller's
    /// trusted record of each signer, never from the commit itself.
    pub fn committed_weight(&self, weight_of: impl Fn(&ValidatorAddress) -> u64) -> u64 {
        self.committed
            .iter()
            .map(weight_of)
            .fold(0u64, u64::saturating_add)
    }
}

/// True when `signed` is strictly more than two thirds of `total`.
pub fn has_quorum(signed: u64, total: u64) -> bool {
    u128::from(signed) * 3 > u128::from(total) * 2
}

/// Verify every non-absent signature in a commit against the trusted key of
/// its signer. One unknown signer or bad signature fails the whole set.
///
/// `validators` maps address to key and is the *only* source of trust; the
/// addresses in `signatures` are just lookups into it.
pub fn verify_signatures(
    template: &VoteTemplate,
    chain_id: &str,
    validators: &BTreeMap<ValidatorAddress, Ed25519PublicKey>,
    signatures: &[CommitSig],
) -> Result<SignatureTally, VerifyError> {
    let mut tally = SignatureTally::default();

    for sig in signatures {
        if sig.block_id_flag == BlockIdFlag::Absent {
            tally.absent += 1;
            continue;
        }

        let address = sig.validator_address.ok_or_else(|| VerifyError::UnknownValidator {
            address: "(missing)".into(),
        })?;
        let pubkey = validators
            .get(&address)
            .ok_or_else(|| VerifyError::UnknownValidator {
                address: address.to_string(),
            })?;

        let message = template.sign_bytes(chain_id, sig.block_id_flag, sig.timestamp);
        verify_ed25519(&address, pubkey, &message, &sig.signature)?;

        match sig.block_id_flag {
            BlockIdFlag::Commit => tally.committed.push(address),
            BlockIdFlag::Nil => tally.nil.push(address),
            BlockIdFlag::Absent => {}
        }
    }

    Ok(tally)
}

fn verify_ed25519(
    address: &ValidatorAddress,
    pubkey: &Ed25519PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), VerifyError> {
    let key = VerifyingKey::from_bytes(&pubkey.0).map_err(|e| VerifyError::InvalidPublicKey {
        address: address.to_string(),
        reason: e.to_string(),
    })?;
    let invalid = || VerifyError::InvalidSignature {
        address: address.to_string(),
    };
    if signature.len() != ED25519_SIGNATURE_LEN {
        return Err(invalid());
    }
    let signature = Signature::from_slice(signature).map_err(|_| invalid())?;
    key.verify(message, &signature).map_err(|_| invalid())
}
