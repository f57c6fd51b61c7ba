//! Common types used throughout the attestation layer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Free-form key/value metadata attached to a report
pub type Metadata = Map<String, Value>;

/// Ledger network the client is bound to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
    Local,
}

impl Network {
    /// Default public RPC endpoint for this network
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Network::Devnet => "https://api.devnet.solana.com",
            Network::Testnet => "https://api.testnet.solana.com",
            Network::Mainnet => "https://api.mainnet-beta.solana.com",
            Network::Local => "http://127.0.0.1:8899",
        }
    }

    /// Placeholder program label selecting the derivation namespace.
    ///
    /// These labels are not valid base58 keys; see
    /// [`crate::derivation::program_namespace`] for how they become addresses.
    pub fn program_label(&self) -> &'static str {
        match self {
            Network::Devnet => "NEURV111111111111111111111111111111111111111",
            Network::Testnet => "NEURV222222222222222222222222222222222222222",
            Network::Mainnet => "NEURV333333333333333333333333333333333333333",
            Network::Local => "NEURV444444444444444444444444444444444444444",
        }
    }

    /// Cluster query parameter understood by the block explorer
    ///
    /// Differs from [`Network::as_str`] where the explorer uses its own names:
    /// mainnet is `mainnet-beta` and a local validator is `custom`.
    pub fn explorer_cluster(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet-beta",
            Network::Local => "custom",
        }
    }

    /// Production network: faucet requests are never issued against it
    pub fn is_production(&self) -> bool {
        matches!(self, Network::Mainnet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
            Network::Local => "local",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            "local" | "localnet" | "localhost" => Ok(Network::Local),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

/// Logical record of one attestation read back from the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAttestation {
    pub job_id: String,
    /// Hex SHA-256 of the report content (empty for verification records)
    pub report_hash: String,
    pub report_type: String,
    pub stakeholder: String,
    pub metadata: Metadata,
    /// Milliseconds since the Unix epoch, as written by the client
    pub timestamp: u64,
    pub authority: String,
    pub transaction_signature: String,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

/// Outcome of a write operation, never mutated after it is returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub success: bool,
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl TransactionResult {
    /// Confirmed transaction
    pub fn confirmed(signature: &str, explorer_url: String) -> Self {
        Self {
            success: true,
            transaction_hash: signature.to_string(),
            signature: Some(signature.to_string()),
            error: None,
            explorer_url: Some(explorer_url),
        }
    }

    /// Successful no-op (nothing was written)
    pub fn noop(note: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_hash: String::new(),
            signature: None,
            error: Some(note.into()),
            explorer_url: None,
        }
    }

    /// Failed write; the signature is kept when the transaction was signed
    pub fn failed(error: impl Into<String>, signature: Option<String>) -> Self {
        Self {
            success: false,
            transaction_hash: signature.clone().unwrap_or_default(),
            signature,
            error: Some(error.into()),
            explorer_url: None,
        }
    }
}

/// Per-authority aggregate snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_reports: u64,
    pub authority: String,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
