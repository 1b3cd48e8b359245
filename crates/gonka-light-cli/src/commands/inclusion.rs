use anyhow::Context;
use gonka_light_api::{endpoints_from_set, participants_from_payload, ApiParticipantsResponse};
use gonka_light_core::VerifierConfig;
use std::path::Path;

pub fn run(payload_path: &Path, config: &VerifierConfig, json: bool) -> anyhow::Result<()> {
    let body = std::fs::read(payload_path)
        .with_context(|| format!("reading {}", payload_path.display()))?;
    let response = ApiParticipantsResponse::from_slice(&body)?;

    let set = participants_from_payload(&response, config)?;
    let endpoints = endpoints_from_set(&set);

    if json {
        println!("{}", serde_json::to_string_pretty(&endpoints)?);
        return Ok(());
    }

    if config.verify_proofs {
        println!("VERIFIED  epoch {} participant list", set.epoch_id);
    } else {
        println!("UNVERIFIED  epoch {} participant list (proofs disabled)", set.epoch_id);
    }
    for endpoint in &endpoints {
        println!("  {}  {}", endpoint.address, endpoint.url);
    }
    Ok(())
}
