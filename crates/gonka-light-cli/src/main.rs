use anyhow::Context;
use clap::{Parser, Subcommand};
use gonka_light_core::VerifierConfig;
use std::path::{Path, PathBuf};

mod commands;
mod telemetry;
mod transport;

#[derive(Parser)]
#[command(name = "gonka-light")]
#[command(about = "Verify Gonka active-participant lists from saved node responses", long_about = None)]
struct Cli {
    /// JSON file with verifier settings (verify_proofs, require_quorum, max_epochs)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Accept commits without a 2/3 voting-power quorum
    #[arg(long, global = true)]
    no_quorum: bool,

    /// Give up after stepping back this many epochs
    #[arg(long, global = true)]
    max_epochs: Option<u64>,

    /// Print endpoints as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a saved `v1/epochs/{epoch}/participants` response and list its endpoints
    Inclusion {
        payload: PathBuf,

        /// Trust the server's JSON list without checking the proof
        #[arg(long)]
        no_verify: bool,
    },
    /// Trace an epoch's participants back to a trusted app hash through saved responses.
    /// Files are named after request paths: `v1/epochs/2/participants.json`,
    /// `chain-rpc/block_height_210.json`, `chain-rpc/validators_height_210.json`.
    Custody {
        dir: PathBuf,

        /// Trusted app hash, usually genesis (hex)
        #[arg(long)]
        anchor: String,

        /// Epoch to start from: `current` or a number
        #[arg(long, default_value = "current")]
        epoch: String,
    },
}

/// Settings from `--config` (if any), then overridden by flags.
fn load_config(
    path: Option<&Path>,
    no_quorum: bool,
    max_epochs: Option<u64>,
) -> anyhow::Result<VerifierConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            VerifierConfig::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => VerifierConfig::default(),
    };
    if no_quorum {
        config = config.without_quorum();
    }
    if let Some(max) = max_epochs {
        config = config.with_max_epochs(max);
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.verbose);

    let mut config = load_config(cli.config.as_deref(), cli.no_quorum, cli.max_epochs)?;

    match cli.command {
        Commands::Inclusion { payload, no_verify } => {
            if no_verify {
                config.verify_proofs = false;
            }
            commands::inclusion::run(&payload, &config, cli.json)
        }
        Commands::Custody { dir, anchor, epoch } => {
            commands::custody::run(&dir, &anchor, &epoch, config, cli.json)
        }
    }
}
