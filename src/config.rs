//! Configuration module for the attestation client
//!
//! Configuration is loaded from a TOML file, with `.env` support and
//! environment variable overrides:
//! - `ATTEST_NETWORK`: devnet | testnet | mainnet | local
//! - `ATTEST_RPC_URL`: custom RPC endpoint
//! - `ATTEST_KEYPAIR`: path to the signer keypair file

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::connection::DEFAULT_EXPLORER_BASE;
use crate::types::Network;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Network selection and RPC behaviour
    #[serde(default)]
    pub network: NetworkConfig,

    /// Signer configuration
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Block explorer links
    #[serde(default)]
    pub explorer: ExplorerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub name: Network,

    /// Overrides the network's default endpoint
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Signature status poll interval
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Status polls before an airdrop is reported unconfirmed
    #[serde(default = "default_airdrop_confirm_polls")]
    pub airdrop_confirm_polls: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_explorer_base")]
    pub base_url: String,
}

// Default value functions
fn default_rpc_timeout() -> u64 { 30 }
fn default_poll_interval_ms() -> u64 { 500 }
fn default_airdrop_confirm_polls() -> u32 { 60 }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_explorer_base() -> String { DEFAULT_EXPLORER_BASE.to_string() }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: Network::default(),
            rpc_url: None,
            timeout_secs: default_rpc_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
            airdrop_confirm_polls: default_airdrop_confirm_polls(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: default_explorer_base(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML in {}", path))?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `ATTEST_*` overrides from the process environment
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(name) = std::env::var("ATTEST_NETWORK") {
            self.network.name = name
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid ATTEST_NETWORK")?;
        }
        if let Ok(url) = std::env::var("ATTEST_RPC_URL") {
            self.network.rpc_url = Some(url);
        }
        if let Ok(path) = std::env::var("ATTEST_KEYPAIR") {
            self.wallet.keypair_path = path;
        }
        Ok(())
    }

    /// Effective RPC endpoint
    pub fn rpc_url(&self) -> String {
        self.network
            .rpc_url
            .clone()
            .unwrap_or_else(|| self.network.name.rpc_url().to_string())
    }

    /// Keypair path with a leading `~` expanded
    pub fn keypair_path(&self) -> String {
        let path = &self.wallet.keypair_path;
        match (path.strip_prefix("~/"), std::env::var("HOME")) {
            (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
            _ => path.clone(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.rpc_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("Invalid RPC URL format: {}", url);
        }
        if self.network.timeout_secs == 0 {
            bail!("network.timeout_secs must be > 0");
        }
        if self.network.airdrop_confirm_polls == 0 {
            bail!("network.airdrop_confirm_polls must be > 0");
        }
        if !self.explorer.base_url.starts_with("http") {
            bail!("Invalid explorer base URL: {}", self.explorer.base_url);
        }
        Ok(())
    }
}
