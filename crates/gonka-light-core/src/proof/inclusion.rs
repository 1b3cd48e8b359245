use crate::error::{ProofStage, VerifyError};
use crate::proof::ics23::{membership_root, sha256, ProofSpec, IAVL_SPEC, TENDERMINT_SPEC};
use crate::types::proof::*;

/// Verify that `value` is committed to by `app_hash` through the network's fixed
/// two-op proof: `ics23:iavl` (key → value inside the module store) followed by
/// `ics23:simple` (store name → store root inside the multi-store).
///
/// Step 2 only runs on the store root step 1 reconstructed, so a failing store
/// proof can never be masked by the multi-store proof.
pub fn verify_participants_against_app_hash(
    app_hash: &[u8],
    proof_ops: &[ProofOp],
    value: &[u8],
) -> Result<(), VerifyError> {
    if app_hash.is_empty() {
        return Err(VerifyError::InvalidInput {
            reason: "app hash is empty".into(),
        });
    }
    if proof_ops.len() != 2 {
        return Err(VerifyError::malformed(format!(
            "expected 2 proof ops, got {}",
            proof_ops.len()
        )));
    }

    // Step 1: participant key → participant bytes in the store
    let store_root = prove_step(&proof_ops[0], ProofOpKind::Iavl, value, ProofStage::Store)?;

    // Step 2: store name → store root in the app hash
    let root = prove_step(
        &proof_ops[1],
        ProofOpKind::Simple,
        &store_root,
        ProofStage::MultiStore,
    )?;

    if root.as_slice() != app_hash {
        return Err(VerifyError::ProofMismatch {
            stage: ProofStage::MultiStore,
            computed: hex::encode(root),
            expected: hex::encode(app_hash),
        });
    }
    Ok(())
}

/// Alias kept for callers that think in terms of "verify this query's inclusion".
pub fn verify_inclusion(
    app_hash: &[u8],
    proof_ops: &[ProofOp],
    value: &[u8],
) -> Result<(), VerifyError> {
    verify_participants_against_app_hash(app_hash, proof_ops, value)
}

fn prove_step(
    op: &ProofOp,
    expected: ProofOpKind,
    value: &[u8],
    stage: ProofStage,
) -> Result<[u8; 32], VerifyError> {
    match ProofOpKind::from_tag(&op.op_type) {
        Some(kind) if kind == expected => {}
        _ => {
            return Err(VerifyError::malformed(format!(
                "unexpected {} proof op type: {:?} (want {})",
                stage,
                op.op_type,
                expected.tag()
            )))
        }
    }

    let proof = ExistenceProof::decode_commitment(&op.data).map_err(|e| {
        VerifyError::malformed(format!("failed to decode {} proof: {}", stage, e))
    })?;

    if proof.value != value {
        return Err(VerifyError::ProofMismatch {
            stage,
            computed: hex::encode(sha256(&proof.value)),
            expected: hex::encode(sha256(value)),
        });
    }

    membership_root(spec_for(expected), &proof, &op.key, value)
}

fn spec_for(kind: ProofOpKind) -> &'static ProofSpec {
    match kind {
        ProofOpKind::Iavl => &IAVL_SPEC,
        ProofOpKind::Simple => &TENDERMINT_SPEC,
    }
}
