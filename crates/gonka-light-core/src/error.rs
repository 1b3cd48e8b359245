use std::fmt;
use thiserror::Error;

/// Which of the two inclusion proofs a mismatch was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofStage {
    /// `ics23:iavl`: participant key → participant bytes inside the module store.
    Store,
    /// `ics23:simple`: store name → store root inside the multi-store app hash.
    MultiStore,
}

impl fmt::Display for ProofStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofStage::Store => write!(f, "store (ics23:iavl)"),
            ProofStage::MultiStore => write!(f, "multi-store (ics23:simple)"),
        }
    }
}

/// Errors raised by the collaborators that fetch participants, blocks and validators.
/// The core never retries these; it wraps them in [`VerifyError::FetchFailure`].
///
/// A body that parsed but carries an undecodable field (bad base64 in a proof,
/// a signature that is not base64) is malformed, not flaky: retrying the same
/// server gets the same bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status} for {path}")]
    Status { status: u16, path: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Response decode failed: {0}")]
    Decode(String),

    #[error("Undecodable proof in response: {0}")]
    MalformedProof(String),

    #[error("Undecodable field in response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::MalformedProof(_) | FetchError::Malformed(_))
    }
}

/// Errors from participant-set verification.
/// Each variant is specific enough to tell a forged list apart from a flaky server.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Malformed proof: {reason}")]
    MalformedProof { reason: String },

    #[error("Proof mismatch at {stage} stage: computed root {computed} does not match expected root {expected}")]
    ProofMismatch {
        stage: ProofStage,
        computed: String,
        expected: String,
    },

    #[error("Unknown validator {address}: no trusted public key for this signer")]
    UnknownValidator { address: String },

    #[error("Invalid signature from validator {address}")]
    InvalidSignature { address: String },

    #[error("Invalid public key for validator {address}: {reason}")]
    InvalidPublicKey { address: String, reason: String },

    #[error("Insufficient voting power at height {height}: {signed}/{total} signed (need more than 2/3)")]
    InsufficientVotingPower { height: u64, signed: u64, total: u64 },

    #[error("Commit at height {height} carries no signatures for the block")]
    EmptyCommit { height: u64 },

    #[error("Commit does not finalize the header at height {height}: {reason}")]
    CommitMismatch { height: u64, reason: String },

    #[error("Header at height {height} has no validators hash and cannot be hashed")]
    IncompleteHeader { height: u64 },

    #[error("Validator set at height {height} hashes to {got}, header commits to {expected}")]
    ValidatorSetMismatch {
        height: u64,
        expected: String,
        got: String,
    },

    #[error("Block at height {height} has app hash {got}, participants response claimed {expected}")]
    HeaderMismatch {
        height: u64,
        expected: String,
        got: String,
    },

    #[error("Requested epoch {expected}, response describes epoch {got}")]
    EpochMismatch { expected: u64, got: u64 },

    #[error("Malformed participant set: {reason}")]
    MalformedParticipants { reason: String },

    #[error("Fetch failed ({context}): {source}")]
    FetchFailure {
        context: String,
        #[source]
        source: FetchError,
    },

    #[error("participants unverified: expected {anchor}, chain did not reach it (stopped at epoch {last_epoch})")]
    ChainExhausted { anchor: String, last_epoch: u64 },

    #[error("Custody walk exceeded {max_epochs} epochs without reaching the anchor")]
    DepthExceeded { max_epochs: u64 },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl VerifyError {
    /// True for network-level failures only. A proof or signature failure is
    /// never transient and must not be retried as if it were.
    pub fn is_transient(&self) -> bool {
        match self {
            VerifyError::FetchFailure { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        VerifyError::MalformedProof {
            reason: reason.into(),
        }
    }

    /// Wrap a source failure. Undecodable proof bytes are a malformed proof
    /// no matter which layer noticed them.
    pub(crate) fn fetch(context: impl Into<String>, source: FetchError) -> Self {
        match source {
            FetchError::MalformedProof(reason) => VerifyError::MalformedProof {
                reason: format!("{} ({})", reason, context.into()),
            },
            source => VerifyError::FetchFailure {
                context: context.into(),
                source,
            },
        }
    }
}
