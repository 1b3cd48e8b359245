use crate::payload::{parse_block, parse_validators, ApiParticipantsResponse};
use gonka_light_core::{
    Block, ChainSource, EpochRef, FetchError, ParticipantsWithProof, Validator,
};
use tracing::debug;

/// Fetches the raw body behind a path relative to a Gonka node's API root.
pub trait Transport {
    fn get(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        (**self).get(path)
    }
}

pub fn participants_path(epoch: EpochRef) -> String {
    format!("v1/epochs/{}/participants", epoch)
}

pub fn block_path(height: u64) -> String {
    format!("chain-rpc/block?height={}", height)
}

pub fn validators_path(height: u64) -> String {
    format!("chain-rpc/validators?height={}", height)
}

/// A [`ChainSource`] over a node's REST and chain-RPC paths.
pub struct RestSource<T> {
    transport: T,
}

impl<T: Transport> RestSource<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        debug!(path, "GET");
        let body = self.transport.get(path)?;
        debug!(path, bytes = body.len(), "Fetched");
        Ok(body)
    }
}

impl<T: Transport> ChainSource for RestSource<T> {
    fn participants(&self, epoch: EpochRef) -> Result<ParticipantsWithProof, FetchError> {
        let body = self.fetch(&participants_path(epoch))?;
        let response = ApiParticipantsResponse::from_slice(&body)?;
        Ok(response.to_core()?)
    }

    fn block(&self, height: u64) -> Result<Block, FetchError> {
        let body = self.fetch(&block_path(height))?;
        Ok(parse_block(&body)?)
    }

    fn validators(&self, height: u64) -> Result<Vec<Validator>, FetchError> {
        let body = self.fetch(&validators_path(height))?;
        Ok(parse_validators(&body)?)
    }
}
