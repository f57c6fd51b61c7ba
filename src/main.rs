//! report-attest command line client
//!
//! Anchors report hashes on Solana and reads attestations back. Every command
//! prints its result as JSON on stdout; diagnostics go through `tracing` on
//! stderr.

#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use report_attest::metrics::metrics;
use report_attest::{
    AttestationClient, Config, KeypairSigner, Metadata, Network, Pubkey, ReportSigner, Signature,
    StoreReportRequest,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "attest.toml")]
    config: String,

    /// Network override (devnet, testnet, mainnet, local)
    #[arg(short, long)]
    network: Option<Network>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the storage record for the configured wallet
    Init,

    /// Hash a report file and anchor its attestation
    Store {
        #[arg(long)]
        job_id: String,

        /// Report file to hash
        #[arg(long)]
        file: String,

        #[arg(long, default_value = "pdf")]
        report_type: String,

        #[arg(long, default_value = "researcher")]
        stakeholder: String,

        /// Extra metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Record a verification for a stored report
    Verify {
        #[arg(long)]
        job_id: String,

        #[arg(long, default_value = "")]
        data: String,
    },

    /// Read an attestation by transaction signature
    Get { signature: String },

    /// Check whether a transaction is on the ledger
    Exists { signature: String },

    /// Storage snapshot for an authority (defaults to the wallet)
    Stats { authority: Option<Pubkey> },

    /// Balance in SOL (defaults to the wallet)
    Balance { address: Option<Pubkey> },

    /// Request test funds (not available on mainnet)
    Airdrop {
        #[arg(long, default_value_t = 1.0)]
        amount: f64,

        address: Option<Pubkey>,
    },

    /// Estimated fee of one attestation write
    Estimate,

    /// Explorer link for a transaction signature or an address
    Explorer { target: String },

    /// Print metrics in Prometheus text format
    Metrics,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.json_logs)?;

    let mut config = load_config(&args.config)?;
    if let Some(network) = args.network {
        config.network.name = network;
    }
    config.validate().context("Invalid configuration")?;

    let client = AttestationClient::from_config(&config);
    info!(network = %client.network(), version = env!("CARGO_PKG_VERSION"), "report-attest ready");

    match args.command {
        Command::Init => {
            let signer = load_signer(&config)?;
            print_json(&client.initialize_storage(&signer).await?)
        }
        Command::Store {
            job_id,
            file,
            report_type,
            stakeholder,
            metadata,
        } => {
            let signer = load_signer(&config)?;
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read report file {}", file))?;
            let metadata = match metadata {
                Some(raw) => serde_json::from_str::<Metadata>(&raw)
                    .context("--metadata must be a JSON object")?,
                None => Metadata::new(),
            };
            let request = StoreReportRequest {
                job_id,
                content,
                report_type,
                stakeholder,
                metadata,
            };
            print_json(&client.store_report(request, &signer).await?)
        }
        Command::Verify { job_id, data } => {
            let signer = load_signer(&config)?;
            print_json(&client.verify_report(&job_id, &data, &signer).await?)
        }
        Command::Get { signature } => match client.get_report(&signature).await? {
            Some(report) => print_json(&report),
            None => bail!("No attestation found for {}", signature),
        },
        Command::Exists { signature } => {
            print_json(&client.transaction_exists(&signature).await?)
        }
        Command::Stats { authority } => {
            let authority = resolve_address(authority, &config)?;
            print_json(&client.get_storage_stats(&authority).await?)
        }
        Command::Balance { address } => {
            let address = resolve_address(address, &config)?;
            print_json(&client.get_balance(&address).await?)
        }
        Command::Airdrop { amount, address } => {
            let address = resolve_address(address, &config)?;
            let signature = client.request_airdrop(&address, amount).await?;
            print_json(&signature.to_string())
        }
        Command::Estimate => print_json(&client.estimate_transaction_cost()),
        Command::Explorer { target } => {
            let url = if let Ok(signature) = target.parse::<Signature>() {
                client.explorer_tx_url(&signature)
            } else if let Ok(address) = target.parse::<Pubkey>() {
                client.explorer_address_url(&address)
            } else {
                bail!("'{}' is neither a signature nor an address", target);
            };
            print_json(&url)
        }
        Command::Metrics => {
            print!("{}", metrics().gather_text()?);
            Ok(())
        }
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "report_attest=debug,info"
    } else {
        "report_attest=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        dotenvy::dotenv().ok();
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }
}

fn load_signer(config: &Config) -> Result<KeypairSigner> {
    let path = config.keypair_path();
    let signer = KeypairSigner::from_file(&path)
        .with_context(|| format!("Failed to load keypair from {}", path))?;
    info!(wallet = %signer.pubkey(), "Wallet loaded");
    Ok(signer)
}

fn resolve_address(address: Option<Pubkey>, config: &Config) -> Result<Pubkey> {
    match address {
        Some(address) => Ok(address),
        None => Ok(load_signer(config)?.pubkey()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
