use crate::transport::DirTransport;
use gonka_light_api::{endpoints_from_set, RestSource};
use gonka_light_core::{verify_chain_of_custody, VerifierConfig};
use std::path::Path;
use tracing::error;

pub fn run(
    dir: &Path,
    anchor: &str,
    epoch: &str,
    config: VerifierConfig,
    json: bool,
) -> anyhow::Result<()> {
    let source = RestSource::new(DirTransport::new(dir));

    let verified = verify_chain_of_custody(source, config, anchor, epoch).map_err(|e| {
        if e.is_transient() {
            error!("Missing or unreadable response under {}: {}", dir.display(), e);
        }
        e
    })?;
    let endpoints = endpoints_from_set(&verified.participants);

    if json {
        println!("{}", serde_json::to_string_pretty(&endpoints)?);
        return Ok(());
    }

    println!(
        "VERIFIED  epoch {} traced to anchor at epoch {} ({} hand-offs)",
        verified.epoch_id, verified.anchor_epoch, verified.hops
    );
    println!("App hash: {}", hex::encode_upper(&verified.app_hash));
    for endpoint in &endpoints {
        println!("  {}  {}", endpoint.address, endpoint.url);
    }
    Ok(())
}
