use crate::error::FetchError;
use crate::types::chain::{Block, Validator};
use crate::types::participants::{EpochRef, ParticipantsWithProof};

/// Where the custody walk gets its untrusted data from.
///
/// Implementations do I/O and nothing else: no retries are expected from the
/// walker, and nothing returned here is trusted until it has been verified.
pub trait ChainSource {
    /// Participants of an epoch together with the inclusion proof for them.
    fn participants(&self, epoch: EpochRef) -> Result<ParticipantsWithProof, FetchError>;

    /// The block at `height`, including the commit it carries.
    fn block(&self, height: u64) -> Result<Block, FetchError>;

    /// The validator set that was active at `height`.
    fn validators(&self, height: u64) -> Result<Vec<Validator>, FetchError>;
}

impl<T: ChainSource + ?Sized> ChainSource for &T {
    fn participants(&self, epoch: EpochRef) -> Result<ParticipantsWithProof, FetchError> {
        (**self).participants(epoch)
    }

    fn block(&self, height: u64) -> Result<Block, FetchError> {
        (**self).block(height)
    }

    fn validators(&self, height: u64) -> Result<Vec<Validator>, FetchError> {
        (**self).validators(height)
    }
}

/// A [`ChainSource`] made of three plain fetch functions.
pub struct FnSource<P, B, V> {
    fetch_participants: P,
    fetch_block: B,
    fetch_validators: V,
}

impl<P, B, V> FnSource<P, B, V>
where
    P: Fn(EpochRef) -> Result<ParticipantsWithProof, FetchError>,
    B: Fn(u64) -> Result<Block, FetchError>,
    V: Fn(u64) -> Result<Vec<Validator>, FetchError>,
{
    pub fn new(fetch_participants: P, fetch_block: B, fetch_validators: V) -> Self {
        Self {
            fetch_participants,
            fetch_block,
            fetch_validators,
        }
    }
}

impl<P, B, V> ChainSource for FnSource<P, B, V>
where
    P: Fn(EpochRef) -> Result<ParticipantsWithProof, FetchError>,
    B: Fn(u64) -> Result<Block, FetchError>,
    V: Fn(u64) -> Result<Vec<Validator>, FetchError>,
{
    fn participants(&self, epoch: EpochRef) -> Result<ParticipantsWithProof, FetchError> {
        (self.fetch_participants)(epoch)
    }

    fn block(&self, height: u64) -> Result<Block, FetchError> {
        (self.fetch_block)(height)
    }

    fn validators(&self, height: u64) -> Result<Vec<Validator>, FetchError> {
        (self.fetch_validators)(height)
    }
}
