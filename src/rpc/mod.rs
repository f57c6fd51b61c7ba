//! Ledger RPC access
//!
//! The attestation layer talks to the ledger only through [`LedgerRpc`], so the
//! same registry code runs against a real cluster ([`SolanaRpc`]) or the
//! in-memory ledger used by tests.

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, VersionedTransaction},
};

pub mod rpc_errors;
pub mod solana_rpc;

pub use rpc_errors::{RpcError, RpcResult};
pub use solana_rpc::SolanaRpc;

/// Status of a broadcast signature at the configured commitment level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Not yet visible, or visible below the required commitment
    Pending,
    /// Reached the required commitment without error
    Confirmed,
    /// Landed but the transaction failed on-chain
    Failed(String),
}

/// Minimal ledger surface needed by the attestation layer
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Endpoint identifier used in logs and errors
    fn endpoint(&self) -> &str;

    /// Whether the address currently holds an account
    async fn account_exists(&self, address: &Pubkey) -> RpcResult<bool>;

    /// Latest blockhash and the last block height at which it is valid
    async fn latest_blockhash(&self) -> RpcResult<(Hash, u64)>;

    /// Current block height
    async fn block_height(&self) -> RpcResult<u64>;

    /// Broadcast a signed transaction
    async fn send_transaction(&self, transaction: &Transaction) -> RpcResult<Signature>;

    async fn signature_state(&self, signature: &Signature) -> RpcResult<SignatureState>;

    /// Fetch a confirmed transaction; `Ok(None)` when the ledger has no such signature
    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> RpcResult<Option<VersionedTransaction>>;

    /// Balance in lamports
    async fn get_balance(&self, address: &Pubkey) -> RpcResult<u64>;

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> RpcResult<Signature>;
}
