//! # Gonka Light Core
//!
//! Pure Rust verification of Gonka active-participant sets.
//!
//! This crate contains **no networking code**. Every participant list a client
//! intends to route requests to passes through these functions before it is
//! trusted; fetching is left to a [`ChainSource`] supplied by the caller.
//!
//! ## Trust Model
//!
//! - **Inclusion proofs** (`proof` module): two ICS23 existence proofs, IAVL
//!   store then multi-store, tie the participant bytes to a block's app hash.
//!   No trust beyond the app hash itself.
//!
//! - **Commit signatures** (`consensus` module): the header carrying that app
//!   hash is hashed, and the commit for exactly that hash and height must be
//!   signed by validators that the previous epoch certified as its active
//!   participants, holding more than 2/3 of those participants' weight. The
//!   fetched validator set must match the header's `validators_hash`.
//!
//! - **Chain of custody** (`custody` module): repeated epoch by epoch until a
//!   block carrying an out-of-band trusted hash (usually genesis) is reached.
//!
//! ## Usage
//!
//! ```ignore
//! use gonka_light_core::{parse_anchor_hash, CustodyWalker, EpochRef, VerifierConfig};
//!
//! let anchor = parse_anchor_hash(GENESIS_APP_HASH)?;
//! let walker = CustodyWalker::new(source, VerifierConfig::default());
//! let verified = walker.verify_chain(&anchor, EpochRef::Current)?;
//! ```

pub mod config;
pub mod consensus;
pub mod custody;
pub mod error;
pub mod proof;
pub mod types;

mod protobuf;

// Re-export commonly used types for convenience
pub use config::VerifierConfig;
pub use consensus::{
    anchor::{parse_anchor_hash, TrustAnchor},
    header::{merkle_root, validator_set_hash},
    signatures::{has_quorum, verify_signatures, SignatureTally},
    vote::{canonical_vote_bytes, VoteTemplate},
};
pub use custody::{
    source::{ChainSource, FnSource},
    walker::{verify_chain_of_custody, CustodyWalker, VerifiedChain},
};
pub use error::{FetchError, ProofStage, VerifyError};
pub use proof::{
    ics23::{verify_membership, ProofSpec, IAVL_SPEC, TENDERMINT_SPEC},
    inclusion::{verify_inclusion, verify_participants_against_app_hash},
};
pub use types::{chain::*, participants::*, proof::*};
