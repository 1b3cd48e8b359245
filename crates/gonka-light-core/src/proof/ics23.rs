use crate::error::VerifyError;
use crate::types::proof::*;
use sha2::{Digest, Sha256};

/// Constraints an existence proof must satisfy for one tree shape.
/// Mirrors the fields of an ICS23 `ProofSpec` that the two supported shapes use.
#[derive(Clone, Debug)]
pub struct ProofSpec {
    pub name: &'static str,
    pub leaf_hash: HashOp,
    pub prehash_key: HashOp,
    pub prehash_value: HashOp,
    pub length: LengthOp,
    /// Every leaf prefix must start with these bytes, and no inner prefix may.
    pub leaf_prefix: &'static [u8],
    pub inner_hash: HashOp,
    pub child_size: usize,
    pub min_prefix_length: usize,
    pub max_prefix_length: usize,
}

impl ProofSpec {
    /// Largest inner prefix allowed for a binary tree: the fixed header plus one sibling.
    fn max_inner_prefix(&self) -> usize {
        self.max_prefix_length + self.child_size
    }
}

/// IAVL store spec (`ics23.IavlSpec`).
pub const IAVL_SPEC: ProofSpec = ProofSpec {
    name: "iavl",
    leaf_hash: HashOp::Sha256,
    prehash_key: HashOp::NoHash,
    prehash_value: HashOp::Sha256,
    length: LengthOp::VarProto,
    leaf_prefix: &[0x00],
    inner_hash: HashOp::Sha256,
    child_size: 33,
    min_prefix_length: 4,
    max_prefix_length: 12,
};

/// Tendermint simple Merkle spec used for the multi-store (`ics23.TendermintSpec`).
pub const TENDERMINT_SPEC: ProofSpec = ProofSpec {
    name: "tendermint",
    leaf_hash: HashOp::Sha256,
    prehash_key: HashOp::NoHash,
    prehash_value: HashOp::Sha256,
    length: LengthOp::VarProto,
    leaf_prefix: &[0x00],
    inner_hash: HashOp::Sha256,
    child_size: 32,
    min_prefix_length: 1,
    max_prefix_length: 1,
};

/// SHA256 of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

fn do_hash(op: HashOp, data: &[u8]) -> Vec<u8> {
    match op {
        HashOp::NoHash => data.to_vec(),
        HashOp::Sha256 => sha256(data).to_vec(),
    }
}

fn do_length(op: LengthOp, data: &[u8], out: &mut Vec<u8>) {
    if op == LengthOp::VarProto {
        crate::protobuf::encode_varint(data.len() as u64, out);
    }
    out.extend_from_slice(data);
}

/// Hash a leaf: `H(prefix || len(k') || k' || len(v') || v')`.
pub fn apply_leaf(leaf: &LeafOp, key: &[u8], value: &[u8]) -> Result<Vec<u8>, VerifyError> {
    if key.is_empty() {
        return Err(VerifyError::malformed("Leaf op needs a key"));
    }
    if value.is_empty() {
        return Err(VerifyError::malformed("Leaf op needs a value"));
    }
    let mut data = leaf.prefix.clone();
    do_length(leaf.length, &do_hash(leaf.prehash_key, key), &mut data);
    do_length(leaf.length, &do_hash(leaf.prehash_value, value), &mut data);
    Ok(do_hash(leaf.hash, &data))
}

/// Hash one inner node: `H(prefix || child || suffix)`.
pub fn apply_inner(inner: &InnerOp, child: &[u8]) -> Result<Vec<u8>, VerifyError> {
    if child.is_empty() {
        return Err(VerifyError::malformed("Inner op needs a child hash"));
    }
    let mut data = Vec::with_capacity(inner.prefix.len() + child.len() + inner.suffix.len());
    data.extend_from_slice(&inner.prefix);
    data.extend_from_slice(child);
    data.extend_from_slice(&inner.suffix);
    Ok(do_hash(inner.hash, &data))
}

/// Reject proofs whose ops do not have the shape the spec allows.
fn check_against_spec(proof: &ExistenceProof, spec: &ProofSpec) -> Result<(), VerifyError> {
    let leaf = &proof.leaf;
    if leaf.hash != spec.leaf_hash
        || leaf.prehash_key != spec.prehash_key
        || leaf.prehash_value != spec.prehash_value
        || leaf.length != spec.length
    {
        return Err(VerifyError::malformed(format!(
            "Leaf op does not match {} spec",
            spec.name
        )));
    }
    if !leaf.prefix.starts_with(spec.leaf_prefix) {
        return Err(VerifyError::malformed(format!(
            "Leaf prefix {} does not start with {} spec prefix",
            hex::encode(&leaf.prefix),
            spec.name
        )));
    }

    for (depth, inner) in proof.path.iter().enumerate() {
        if inner.hash != spec.inner_hash {
            return Err(VerifyError::malformed(format!(
                "Inner op {} uses a hash not allowed by {} spec",
                depth, spec.name
            )));
        }
        // An inner node that looks like a leaf would allow second-preimage tricks.
        if inner.prefix.starts_with(spec.leaf_prefix) {
            return Err(VerifyError::malformed(format!(
                "Inner op {} prefix starts with the leaf prefix",
                depth
            )));
        }
        if inner.prefix.len() < spec.min_prefix_length
            || inner.prefix.len() > spec.max_inner_prefix()
        {
            return Err(VerifyError::malformed(format!(
                "Inner op {} prefix length {} outside {}..={}",
                depth,
                inner.prefix.len(),
                spec.min_prefix_length,
                spec.max_inner_prefix()
            )));
        }
        if inner.suffix.len() % spec.child_size != 0 || inner.suffix.len() > spec.child_size {
            return Err(VerifyError::malformed(format!(
                "Inner op {} suffix length {} is not a single child of {} bytes",
                depth,
                inner.suffix.len(),
                spec.child_size
            )));
        }
    }
    Ok(())
}

/// Recompute the root an existence proof commits to, without checking it against anything.
pub fn calculate_root(proof: &ExistenceProof) -> Result<[u8; 32], VerifyError> {
    let mut node = apply_leaf(&proof.leaf, &proof.key, &proof.value)?;
    for inner in &proof.path {
        node = apply_inner(inner, &node)?;
    }
    node.as_slice()
        .try_into()
        .map_err(|_| VerifyError::malformed(format!("Root has {} bytes, expected 32", node.len())))
}

/// Check that `proof` proves exactly `(key, value)` under `spec` and return the root it
/// reconstructs. The caller decides what the root is compared against.
pub fn membership_root(
    spec: &ProofSpec,
    proof: &ExistenceProof,
    key: &[u8],
    value: &[u8],
) -> Result<[u8; 32], VerifyError> {
    check_against_spec(proof, spec)?;
    if proof.key != key {
        return Err(VerifyError::malformed(format!(
            "Proof is for key {}, queried key {}",
            hex::encode(&proof.key),
            hex::encode(key)
        )));
    }
    if proof.value != value {
        return Err(VerifyError::malformed(
            "Proof value does not match the queried value",
        ));
    }
    calculate_root(proof)
}

/// ICS23 membership check: true iff `proof` proves `(key, value)` under `root`.
/// Malformed proofs, spec violations and hash mismatches all yield `false`.
pub fn verify_membership(
    spec: &ProofSpec,
    root: &[u8],
    proof: &ExistenceProof,
    key: &[u8],
    value: &[u8],
) -> bool {
    match membership_root(spec, proof, key, value) {
        Ok(computed) => computed.as_slice() == root,
        Err(_) => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn leaf(prefix: &[u8]) -> LeafOp {
        LeafOp {
            hash: HashOp::Sha256,
            prehash_key: HashOp::NoHash,
            prehash_value: HashOp::Sha256,
            length: LengthOp::VarProto,
            prefix: prefix.to_vec(),
        }
    }

    /// IAVL proof of one leaf under a two-leaf tree whose other child is `sibling`.
    pub(crate) fn iavl_proof(key: &[u8], value: &[u8], sibling: [u8; 32]) -> (ExistenceProof, [u8; 32]) {
        let proof = ExistenceProof {
            key: key.to_vec(),
            value: value.to_vec(),
            leaf: leaf(&[0x00, 0x02, 0x02]),
            path: vec![InnerOp {
                hash: HashOp::Sha256,
                // height 1, size 2, version 1 (zigzag varints), then left child length
                prefix: vec![0x02, 0x04, 0x02, 0x20],
                suffix: [vec![0x20], sibling.to_vec()].concat(),
            }],
        };
        let root = calculate_root(&proof).unwrap();
        (proof, root)
    }

    #[test]
    fn test_leaf_hash_layout() {
        let op = leaf(&[0x00]);
        let got = apply_leaf(&op, b"k", b"v").unwrap();

        let mut expected = vec![0x00, 0x01, b'k', 0x20];
        expected.extend_from_slice(&sha256(b"v"));
        assert_eq!(got, sha256(&expected).to_vec());
    }

    #[test]
    fn test_inner_hash_layout() {
        let inner = InnerOp {
            hash: HashOp::Sha256,
            prefix: vec![0x01],
            suffix: vec![0xEE; 32],
        };
        let child = [0x11u8; 32];
        let got = apply_inner(&inner, &child).unwrap();
        let expected = sha256(&[vec![0x01], child.to_vec(), vec![0xEE; 32]].concat());
        assert_eq!(got, expected.to_vec());
    }

    #[test]
    fn test_valid_proof_verifies() {
        let (proof, root) = iavl_proof(b"participants/3", b"payload", [0x42; 32]);
        assert!(verify_membership(&IAVL_SPEC, &root, &proof, b"participants/3", b"payload"));
    }

    #[test]
    fn test_wrong_key_or_value_fails() {
        let (proof, root) = iavl_proof(b"participants/3", b"payload", [0x42; 32]);
        assert!(!verify_membership(&IAVL_SPEC, &root, &proof, b"participants/4", b"payload"));
        assert!(!verify_membership(&IAVL_SPEC, &root, &proof, b"participants/3", b"payloaD"));
    }

    #[test]
    fn test_wrong_root_fails() {
        let (proof, mut root) = iavl_proof(b"k", b"v", [0x42; 32]);
        root[31] ^= 0x01;
        assert!(!verify_membership(&IAVL_SPEC, &root, &proof, b"k", b"v"));
    }

    #[test]
    fn test_iavl_proof_rejected_by_tendermint_spec() {
        // IAVL siblings are 33 bytes with their length prefix; Tendermint siblings are 32.
        let (proof, root) = iavl_proof(b"k", b"v", [0x42; 32]);
        assert!(matches!(
            membership_root(&TENDERMINT_SPEC, &proof, b"k", b"v"),
            Err(VerifyError::MalformedProof { .. })
        ));
        assert!(!verify_membership(&TENDERMINT_SPEC, &root, &proof, b"k", b"v"));
    }

    #[test]
    fn test_inner_prefix_looking_like_leaf_is_rejected() {
        let (mut proof, _) = iavl_proof(b"k", b"v", [0x42; 32]);
        proof.path[0].prefix[0] = 0x00;
        assert!(matches!(
            membership_root(&IAVL_SPEC, &proof, b"k", b"v"),
            Err(VerifyError::MalformedProof { .. })
        ));
    }

    #[test]
    fn test_empty_value_is_malformed() {
        let proof = ExistenceProof {
            key: b"k".to_vec(),
            value: vec![],
            leaf: leaf(&[0x00]),
            path: vec![],
        };
        assert!(matches!(
            calculate_root(&proof),
            Err(VerifyError::MalformedProof { .. })
        ));
    }
}
