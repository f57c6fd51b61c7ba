//! Connection manager
//!
//! One immutable value built at start-up and shared by reference: network
//! selection, derivation namespace, explorer base, confirmation policy and the
//! RPC channel.

use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::derivation::program_namespace;
use crate::rpc::{LedgerRpc, SolanaRpc};
use crate::types::Network;

pub const DEFAULT_EXPLORER_BASE: &str = "https://explorer.solana.com";

/// How the submitter waits for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Delay between signature status polls
    pub poll_interval: Duration,
    /// Poll budget for signatures without a block-height ceiling (faucet)
    pub max_unbounded_polls: u32,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_unbounded_polls: 60,
        }
    }
}

#[derive(Clone)]
pub struct ConnectionManager {
    network: Network,
    namespace: Pubkey,
    explorer_base: String,
    confirm: ConfirmPolicy,
    rpc: Arc<dyn LedgerRpc>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("network", &self.network)
            .field("namespace", &self.namespace)
            .field("endpoint", &self.rpc.endpoint())
            .field("confirm", &self.confirm)
            .finish()
    }
}

impl ConnectionManager {
    pub fn new(network: Network, rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            network,
            namespace: program_namespace(network),
            explorer_base: DEFAULT_EXPLORER_BASE.to_string(),
            confirm: ConfirmPolicy::default(),
            rpc,
        }
    }

    /// Connect to the configured cluster at `confirmed` commitment
    pub fn from_config(config: &Config) -> Self {
        let endpoint = config.rpc_url();
        let rpc = SolanaRpc::new(
            endpoint.clone(),
            CommitmentConfig::confirmed(),
            Duration::from_secs(config.network.timeout_secs),
        );
        info!(network = %config.network.name, endpoint = %endpoint, "Ledger connection configured");

        Self::new(config.network.name, Arc::new(rpc))
            .with_explorer_base(config.explorer.base_url.clone())
            .with_confirm_policy(ConfirmPolicy {
                poll_interval: Duration::from_millis(config.network.poll_interval_ms),
                max_unbounded_polls: config.network.airdrop_confirm_polls,
            })
    }

    pub fn with_explorer_base(mut self, base: impl Into<String>) -> Self {
        self.explorer_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_confirm_policy(mut self, policy: ConfirmPolicy) -> Self {
        self.confirm = policy;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Derivation namespace for this network
    pub fn namespace(&self) -> &Pubkey {
        &self.namespace
    }

    pub fn confirm_policy(&self) -> ConfirmPolicy {
        self.confirm
    }

    pub fn rpc(&self) -> &dyn LedgerRpc {
        self.rpc.as_ref()
    }

    /// `base/tx/{signature}?cluster={cluster}`
    pub fn explorer_tx_url(&self, signature: &Signature) -> String {
        format!(
            "{}/tx/{}?cluster={}",
            self.explorer_base,
            signature,
            self.network.explorer_cluster()
        )
    }

    /// `base/address/{address}?cluster={cluster}`
    pub fn explorer_address_url(&self, address: &Pubkey) -> String {
        format!(
            "{}/address/{}?cluster={}",
            self.explorer_base,
            address,
            self.network.explorer_cluster()
        )
    }
}
