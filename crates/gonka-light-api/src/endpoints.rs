use crate::payload::{ApiParticipantsResponse, PayloadError};
use gonka_light_core::{
    verify_participants_against_app_hash, ActiveParticipantSet, VerifierConfig, VerifyError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Participants payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("Participants verification failed: {0}")]
    Verify(#[from] VerifyError),
}

/// A participant's inference API and the account that gets paid for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    pub address: String,
}

/// Normalize an inference URL so it ends in exactly one `/v1`.
pub fn ensure_v1(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

/// Endpoints of every participant with both a URL and an address.
pub fn endpoints_from_set(set: &ActiveParticipantSet) -> Vec<Endpoint> {
    set.participants
        .iter()
        .filter(|p| !p.inference_url.is_empty() && !p.index.is_empty())
        .map(|p| Endpoint {
            url: ensure_v1(&p.inference_url),
            address: p.index.clone(),
        })
        .collect()
}

/// The participant set a response vouches for.
///
/// With `verify_proofs` on, the set is decoded from the proven bytes once the
/// inclusion proof checks out against the response's app hash. With it off,
/// the server's JSON mirror is taken as-is.
pub fn participants_from_payload(
    response: &ApiParticipantsResponse,
    config: &VerifierConfig,
) -> Result<ActiveParticipantSet, EndpointError> {
    if !config.verify_proofs {
        warn!("Proof verification disabled; using unverified participant list");
        return response
            .active_participants
            .clone()
            .ok_or(EndpointError::Payload(PayloadError::Missing(
                "active_participants",
            )));
    }

    let value = response.participants_bytes()?;
    let proof_ops = response.proof_ops()?;
    let app_hash = response.app_hash()?;
    verify_participants_against_app_hash(&app_hash, &proof_ops, &value)?;

    let set = ActiveParticipantSet::decode(&value)
        .map_err(|reason| VerifyError::MalformedParticipants { reason })?;
    debug!(
        epoch = set.epoch_id,
        participants = set.participants.len(),
        "Participant list proven against app hash"
    );
    Ok(set)
}

pub fn endpoints_from_payload(
    response: &ApiParticipantsResponse,
    config: &VerifierConfig,
) -> Result<Vec<Endpoint>, EndpointError> {
    Ok(endpoints_from_set(&participants_from_payload(
        response, config,
    )?))
}
