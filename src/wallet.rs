//! Signing capability
//!
//! The attestation layer never holds key material of its own: every write is
//! signed through a caller-supplied [`ReportSigner`]. [`KeypairSigner`] is the
//! bundled adapter for a local Solana CLI keypair file.

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    /// The signer declined to sign (e.g. user rejection in a wallet)
    #[error("signature request rejected: {0}")]
    Rejected(String),

    /// Signing was attempted but did not produce a valid signature
    #[error("signing failed: {0}")]
    Failed(String),

    #[error("invalid keypair: {0}")]
    InvalidKeypair(String),
}

/// External signing capability
#[async_trait]
pub trait ReportSigner: Send + Sync {
    /// Public key of this signer; used as fee payer and authority
    fn pubkey(&self) -> Pubkey;

    /// Sign a transaction whose fee payer and blockhash are already set
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, SignerError>;
}

/// Local keypair signer
#[derive(Clone)]
pub struct KeypairSigner {
    keypair: Arc<Keypair>,
}

impl std::fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("pubkey", &self.keypair.pubkey())
            .finish()
    }
}

impl KeypairSigner {
    /// Load a keypair file: a JSON byte array (Solana CLI format) or 64 raw bytes
    pub fn from_file(path: &str) -> Result<Self, SignerError> {
        let keypair_bytes = std::fs::read(path).map_err(|e| {
            SignerError::InvalidKeypair(format!("Failed to read keypair file {}: {}", path, e))
        })?;

        if keypair_bytes.len() == 64 {
            return Self::from_bytes(&keypair_bytes);
        }

        let json: Vec<u8> = serde_json::from_slice(&keypair_bytes)
            .map_err(|e| SignerError::InvalidKeypair(format!("Failed to parse keypair JSON: {}", e)))?;
        Self::from_bytes(&json)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        if bytes.len() != 64 {
            return Err(SignerError::InvalidKeypair(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }
        if bytes.iter().all(|&b| b == 0) {
            return Err(SignerError::InvalidKeypair(
                "all-zero key rejected".to_string(),
            ));
        }
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| SignerError::InvalidKeypair(e.to_string()))?;
        Ok(Self::from_keypair(keypair))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }
}

#[async_trait]
impl ReportSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, SignerError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[self.keypair.as_ref()], blockhash)
            .map_err(|e| SignerError::Failed(e.to_string()))?;
        Ok(transaction)
    }
}
